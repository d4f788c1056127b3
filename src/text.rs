use crate::attr::{Attr, Value};
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::{shared_writer, Handler, HandlerOptions, HandlerState, SharedWriter};
use crate::level::Level;
use crate::record::LogRecord;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

/// Renders each record as a line of space-separated `key=value` pairs.
/// Grouped attributes get dotted keys (`http.status=503`).
#[derive(Clone)]
pub struct TextHandler {
    state: HandlerState,
    out: SharedWriter,
}

impl TextHandler {
    pub fn new(writer: impl Write + Send + 'static, opts: HandlerOptions) -> Self {
        TextHandler { state: HandlerState::new(opts), out: shared_writer(writer) }
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty()
        || s.chars().any(|c| c.is_whitespace() || c == '=' || c == '"' || c.is_control())
}

fn push_escaped(line: &mut String, s: &str) {
    if needs_quoting(s) {
        let _ = write!(line, "{:?}", s);
    } else {
        line.push_str(s);
    }
}

fn push_attrs(line: &mut String, prefix: &str, attrs: &[Attr]) {
    for a in attrs {
        let key = if prefix.is_empty() { a.key.clone() } else { format!("{}.{}", prefix, a.key) };
        match &a.value {
            Value::Group(children) => push_attrs(line, &key, children),
            value => {
                if !line.is_empty() {
                    line.push(' ');
                }
                push_escaped(line, &key);
                line.push('=');
                push_escaped(line, &value.to_string());
            }
        }
    }
}

impl Handler for TextHandler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        self.state.enabled(level)
    }

    fn handle(&self, _ctx: &Context, record: LogRecord) -> Result<(), HandlerError> {
        let attrs = self.state.layout(&record);
        let mut line = String::new();
        push_attrs(&mut line, "", &attrs);
        line.push('\n');
        self.out.lock().write_all(line.as_bytes())?;
        Ok(())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(TextHandler { state: self.state.with_attrs(attrs), out: Arc::clone(&self.out) })
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(TextHandler { state: self.state.with_group(name), out: Arc::clone(&self.out) })
    }
}
