/// Error returned by a [`Handler`](crate::handler::Handler) when a record
/// could not be rendered or written.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error("failed to write log record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize log record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error returned when a string does not name a [`Level`](crate::level::Level).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

/// Error returned when installing the global subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("global subscriber already set: {0}")]
    AlreadySet(#[from] tracing::subscriber::SetGlobalDefaultError),
}
