use crate::attr::{args_to_attrs, Arg};
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{LogRecord, Source};
use chrono::Utc;
use std::panic::Location;
use std::sync::Arc;

/// Front end that builds [`LogRecord`]s and passes them to a [`Handler`].
///
/// Cheap to clone; clones share the handler.
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
}

impl Logger {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Logger { handler }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    pub fn enabled(&self, ctx: &Context, level: Level) -> bool {
        self.handler.enabled(ctx, level)
    }

    /// A logger whose records all carry `args`.
    pub fn with(&self, args: Vec<Arg>) -> Logger {
        let attrs = args_to_attrs(args);
        if attrs.is_empty() {
            return self.clone();
        }
        Logger { handler: self.handler.with_attrs(attrs) }
    }

    /// A logger whose later attributes are nested under `name`.
    pub fn with_group(&self, name: &str) -> Logger {
        if name.is_empty() {
            return self.clone();
        }
        Logger { handler: self.handler.with_group(name) }
    }

    /// Emits a record unless the handler filters `level` out.
    ///
    /// The caller's location is recorded as the record's source.
    #[track_caller]
    pub fn log(&self, ctx: &Context, level: Level, msg: &str, args: Vec<Arg>) -> Result<(), HandlerError> {
        if !self.handler.enabled(ctx, level) {
            return Ok(());
        }
        let mut record = LogRecord::new(Utc::now(), level, msg);
        record.source = Some(Source::from(Location::caller()));
        record.add(args);
        self.handler.handle(ctx, record)
    }

    #[track_caller]
    pub fn debug(&self, ctx: &Context, msg: &str, args: Vec<Arg>) -> Result<(), HandlerError> {
        self.log(ctx, Level::DEBUG, msg, args)
    }

    #[track_caller]
    pub fn info(&self, ctx: &Context, msg: &str, args: Vec<Arg>) -> Result<(), HandlerError> {
        self.log(ctx, Level::INFO, msg, args)
    }

    #[track_caller]
    pub fn warn(&self, ctx: &Context, msg: &str, args: Vec<Arg>) -> Result<(), HandlerError> {
        self.log(ctx, Level::WARN, msg, args)
    }

    #[track_caller]
    pub fn error(&self, ctx: &Context, msg: &str, args: Vec<Arg>) -> Result<(), HandlerError> {
        self.log(ctx, Level::ERROR, msg, args)
    }

    /// Emits an unclassified text line at [`Level::INFO`] with no context,
    /// the way lines from a plain line-oriented logger arrive. A trailing
    /// newline is stripped.
    ///
    /// The line is not filtered here: its real level may only be known
    /// once the handler has rewritten it, so the handler decides.
    #[track_caller]
    pub fn print(&self, line: &str) -> Result<(), HandlerError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let mut record = LogRecord::new(Utc::now(), Level::INFO, line);
        record.source = Some(Source::from(Location::caller()));
        self.handler.handle(&Context::background(), record)
    }
}
