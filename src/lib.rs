pub mod level;
pub mod attr;
pub mod record;
pub mod context;
pub mod error;

pub mod handler;
pub mod json;
pub mod text;
pub mod discard;

pub mod transform;
pub mod modifier;
pub mod middleware;
pub mod logger;

pub mod layer;
pub mod init;
pub mod env;
