use crate::attr::Attr;
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::LogRecord;
use std::sync::Arc;

/// A handler that honours its threshold and then drops every record.
///
/// Useful for measuring the overhead of the middleware itself without any
/// rendering or I/O, and for tests that only care about filtering.
#[derive(Clone, Debug, Default)]
pub struct DiscardHandler {
    level: Level,
}

impl DiscardHandler {
    pub fn new(level: Level) -> Self {
        DiscardHandler { level }
    }
}

impl Handler for DiscardHandler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        level >= self.level
    }

    fn handle(&self, _ctx: &Context, _record: LogRecord) -> Result<(), HandlerError> {
        Ok(())
    }

    fn with_attrs(&self, _attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(self.clone())
    }

    fn with_group(&self, _name: &str) -> Arc<dyn Handler> {
        Arc::new(self.clone())
    }
}
