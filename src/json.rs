use crate::attr::{serialize_attrs, Attr};
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::{shared_writer, Handler, HandlerOptions, HandlerState, SharedWriter};
use crate::level::Level;
use crate::record::LogRecord;
use serde::{Serialize, Serializer};
use std::io::Write;
use std::sync::Arc;

/// Renders each record as one JSON object per line.
///
/// Keys appear in the order `time`, `level`, `msg`, `source`, then the
/// attributes. Repeated keys are written as-is.
#[derive(Clone)]
pub struct JsonHandler {
    state: HandlerState,
    out: SharedWriter,
}

impl JsonHandler {
    pub fn new(writer: impl Write + Send + 'static, opts: HandlerOptions) -> Self {
        JsonHandler { state: HandlerState::new(opts), out: shared_writer(writer) }
    }
}

struct Line<'a>(&'a [Attr]);

impl Serialize for Line<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_attrs(self.0, serializer)
    }
}

impl Handler for JsonHandler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        self.state.enabled(level)
    }

    fn handle(&self, _ctx: &Context, record: LogRecord) -> Result<(), HandlerError> {
        let attrs = self.state.layout(&record);
        let mut buf = serde_json::to_vec(&Line(&attrs))?;
        buf.push(b'\n');
        // One write per record so a writer-level modifier sees the whole line.
        self.out.lock().write_all(&buf)?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(JsonHandler { state: self.state.with_attrs(attrs), out: Arc::clone(&self.out) })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(JsonHandler { state: self.state.with_group(name), out: Arc::clone(&self.out) })
    }
}
