use crate::attr::{args_to_attrs, Arg, Attr};
use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where a record was emitted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Source {
    pub file: String,
    pub line: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
}

impl From<&'static std::panic::Location<'static>> for Source {
    fn from(loc: &'static std::panic::Location<'static>) -> Self {
        Source { file: loc.file().to_string(), line: loc.line(), module_path: None }
    }
}

/// One structured log event.
///
/// Attribute keys may repeat; nothing deduplicates them unless
/// [`unique_attrs`](crate::transform::unique_attrs) runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
    pub source: Option<Source>,
}

impl LogRecord {
    pub fn new(time: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        LogRecord { time, level, message: message.into(), attrs: Vec::new(), source: None }
    }

    /// Same header (time, level, message, source) carrying `attrs` instead.
    pub fn with_attrs_replaced(&self, attrs: Vec<Attr>) -> Self {
        LogRecord {
            time: self.time,
            level: self.level,
            message: self.message.clone(),
            attrs,
            source: self.source.clone(),
        }
    }

    pub fn add_attrs(&mut self, attrs: impl IntoIterator<Item = Attr>) {
        self.attrs.extend(attrs);
    }

    /// Appends a loosely-typed argument list, see [`args_to_attrs`].
    pub fn add(&mut self, args: Vec<Arg>) {
        self.attrs.extend(args_to_attrs(args));
    }

    pub fn attr(&self, key: &str) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.key == key)
    }
}
