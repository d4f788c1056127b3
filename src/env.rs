//! Environment variable names used by this crate for convenient
//! configuration from host processes.
//!
//! These are purely helpers; the handler and middleware types remain
//! decoupled from environment access.

use crate::error::ParseLevelError;
use crate::level::Level;

/// Minimum level, e.g. `debug`, `WARN`, `INFO+2` or `-4`.
pub const LOG_MIDDLEWARE_LEVEL_ENV: &str = "LOG_MIDDLEWARE_LEVEL";

/// Level named by [`LOG_MIDDLEWARE_LEVEL_ENV`], or `default` when unset.
pub fn level_from_env(default: Level) -> Result<Level, ParseLevelError> {
    match std::env::var(LOG_MIDDLEWARE_LEVEL_ENV) {
        Ok(s) => s.parse(),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_from_env_parses_variable() {
        std::env::set_var(LOG_MIDDLEWARE_LEVEL_ENV, "warn");
        assert_eq!(level_from_env(Level::INFO), Ok(Level::WARN));
        std::env::set_var(LOG_MIDDLEWARE_LEVEL_ENV, "shouting");
        assert!(level_from_env(Level::INFO).is_err());
        std::env::remove_var(LOG_MIDDLEWARE_LEVEL_ENV);
        assert_eq!(level_from_env(Level::INFO), Ok(Level::INFO));
    }
}
