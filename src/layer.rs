use crate::attr::{Arg, Attr, Value};
use crate::context::Context as LogContext;
use crate::handler::Handler;
use crate::level::Level;
use crate::record::{LogRecord, Source};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`Handler`], typically a
/// [`Middleware`](crate::middleware::Middleware).
///
/// Fields recorded on spans become context attributes: every event sees
/// the fields of its enclosing spans, outermost first, exactly as if each
/// span had derived a [`LogContext`] from its parent.
pub struct MiddlewareLayer {
    handler: Arc<dyn Handler>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events handed to the handler that returned `Ok`. The handler may
    /// still have dropped them, e.g. a record promoted below its threshold.
    pub handled_events: Arc<AtomicU64>,
    /// Events whose handler returned an error.
    pub failed_events: Arc<AtomicU64>,
}

impl MiddlewareLayer {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        MiddlewareLayer {
            handler,
            total_events: Arc::new(AtomicU64::new(0)),
            handled_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Span fields stored in the span's extensions.
struct SpanAttrs(Vec<Attr>);

impl<S> Layer<S> for MiddlewareLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = Vec::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor { attrs: &mut fields, message: &mut message });
        if let Some(message) = message {
            fields.push(Attr::string("message", message));
        }
        span.extensions_mut().insert(SpanAttrs(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = Vec::new();
        let mut message = None;
        values.record(&mut FieldVisitor { attrs: &mut fields, message: &mut message });
        let mut extensions = span.extensions_mut();
        if let Some(existing) = extensions.get_mut::<SpanAttrs>() {
            existing.0.extend(fields);
        } else {
            extensions.insert(SpanAttrs(fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let mut scoped: Option<Vec<Attr>> = None;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanAttrs>() {
                    scoped.get_or_insert_with(Vec::new).extend(fields.0.iter().cloned());
                }
            }
        }
        let log_ctx = match scoped {
            Some(attrs) => LogContext::background().with_attrs(attrs.into_iter().map(Arg::Attr).collect()),
            None => LogContext::background(),
        };

        let meta = event.metadata();
        let level = Level::from(*meta.level());
        if !self.handler.enabled(&log_ctx, level) {
            return;
        }

        let mut attrs = Vec::new();
        let mut message = None;
        event.record(&mut FieldVisitor { attrs: &mut attrs, message: &mut message });

        let mut record = LogRecord::new(Utc::now(), level, message.unwrap_or_default());
        record.attrs = attrs;
        record.source = match (meta.file(), meta.line()) {
            (Some(file), Some(line)) => Some(Source {
                file: file.to_string(),
                line,
                module_path: meta.module_path().map(|s| s.to_string()),
            }),
            _ => None,
        };

        match self.handler.handle(&log_ctx, record) {
            Ok(()) => {
                self.handled_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("error handling log record: {}", e);
            }
        }
    }
}

/// Collects `tracing` fields as [`Attr`]s, pulling out the `message` field.
pub struct FieldVisitor<'a> {
    pub attrs: &'a mut Vec<Attr>,
    pub message: &'a mut Option<String>,
}

impl FieldVisitor<'_> {
    fn push(&mut self, field: &Field, value: Value) {
        self.attrs.push(Attr { key: field.name().to_string(), value });
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.push(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::I64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::U64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::F64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::String(format!("{:?}", value)));
        }
    }
}
