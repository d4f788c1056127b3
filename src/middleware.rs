use crate::attr::Attr;
use crate::context::Context;
use crate::error::HandlerError;
use crate::handler::{Handler, HandlerOptions};
use crate::level::Level;
use crate::modifier::{ModifierFn, ModifierWriter};
use crate::record::LogRecord;
use crate::transform::RecordTransformer;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// Builds the downstream handler around the middleware's writer.
pub type HandlerFactory = Arc<dyn Fn(ModifierWriter, HandlerOptions) -> Arc<dyn Handler> + Send + Sync>;

/// Configuration for a [`Middleware`].
///
/// **Fields**
/// - `modifier_funcs`: per-level line modifiers; levels without an entry
///   are written unmodified.
/// - `record_transformers`: applied in order to every record.
/// - `writer`: final byte sink.
/// - `handler_options`: passed to the handler factory.
pub struct MiddlewareOptions {
    pub modifier_funcs: HashMap<Level, ModifierFn>,
    pub record_transformers: Vec<RecordTransformer>,
    pub writer: Box<dyn Write + Send>,
    pub handler_options: HandlerOptions,
}

impl Default for MiddlewareOptions {
    fn default() -> Self {
        Self {
            modifier_funcs: HashMap::new(),
            record_transformers: Vec::new(),
            writer: Box::new(io::stderr()),
            handler_options: HandlerOptions::default(),
        }
    }
}

// Derivations applied to the factory's handler, replayed when the
// threshold changes.
#[derive(Clone, Debug)]
enum Derivation {
    Attrs(Vec<Attr>),
    Group(String),
}

struct Slot {
    options: HandlerOptions,
    handler: Arc<dyn Handler>,
}

/// [`Handler`] that sits in front of another handler.
///
/// For each record it merges the attributes bound to the [`Context`], runs
/// the record transformers, checks the threshold against the resulting
/// level (a promoted record can fall below it), and then lets the
/// downstream handler render while the [`ModifierWriter`] applies the
/// modifier chosen for the record's level.
///
/// The threshold check runs on every record, whether or not a transformer
/// changed its level. A caller that invokes [`Handler::handle`] without
/// first asking [`Handler::enabled`] still has below-threshold records
/// dropped (and gets `Ok(())`). [`Logger::print`](crate::logger::Logger::print)
/// relies on this to hand over legacy lines unfiltered.
///
/// ```
/// use tracing_log_middleware::{
///     args, context::Context, json::JsonHandler,
///     middleware::{Middleware, MiddlewareOptions}, transform::default_attrs,
/// };
///
/// let middleware = Middleware::new(
///     JsonHandler::new,
///     MiddlewareOptions {
///         record_transformers: vec![default_attrs(args!["service", "billing"])],
///         writer: Box::new(std::io::sink()),
///         ..MiddlewareOptions::default()
///     },
/// );
/// let logger = tracing_log_middleware::logger::Logger::new(std::sync::Arc::new(middleware));
/// logger.info(&Context::background(), "started", args![]).unwrap();
/// ```
pub struct Middleware {
    modifier_funcs: HashMap<Level, ModifierFn>,
    record_transformers: Vec<RecordTransformer>,
    factory: HandlerFactory,
    writer: ModifierWriter,
    derivations: Vec<Derivation>,
    slot: RwLock<Slot>,
}

impl Middleware {
    /// Builds the [`ModifierWriter`] over `opts.writer` and the downstream
    /// handler with `factory(writer, opts.handler_options)`.
    pub fn new<F, H>(factory: F, opts: MiddlewareOptions) -> Self
    where
        F: Fn(ModifierWriter, HandlerOptions) -> H + Send + Sync + 'static,
        H: Handler + 'static,
    {
        let factory: HandlerFactory = Arc::new(move |w, o| Arc::new(factory(w, o)) as Arc<dyn Handler>);
        let writer = ModifierWriter::new(opts.writer);
        let handler = factory(writer.clone(), opts.handler_options.clone());
        Middleware {
            modifier_funcs: opts.modifier_funcs,
            record_transformers: opts.record_transformers,
            factory,
            writer,
            derivations: Vec::new(),
            slot: RwLock::new(Slot { options: opts.handler_options, handler }),
        }
    }

    /// Rebuilds the downstream handler with a new threshold.
    ///
    /// Attributes and groups bound through [`Handler::with_attrs`] and
    /// [`Handler::with_group`] on this middleware are preserved.
    pub fn set_minimum_level(&self, level: Level) {
        let mut slot = self.slot.write();
        slot.options.level = level;
        let mut handler = (self.factory)(self.writer.clone(), slot.options.clone());
        for d in &self.derivations {
            handler = match d {
                Derivation::Attrs(attrs) => handler.with_attrs(attrs.clone()),
                Derivation::Group(name) => handler.with_group(name),
            };
        }
        slot.handler = handler;
    }

    /// Like [`Handler::with_attrs`], but keeps the concrete type so the
    /// derived middleware's threshold can still be changed.
    pub fn bind(&self, attrs: Vec<Attr>) -> Middleware {
        self.derive(Derivation::Attrs(attrs))
    }

    /// Like [`Handler::with_group`], keeping the concrete type.
    pub fn group(&self, name: &str) -> Middleware {
        self.derive(Derivation::Group(name.to_string()))
    }

    pub fn minimum_level(&self) -> Level {
        self.slot.read().options.level
    }

    fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.slot.read().handler)
    }

    fn derive(&self, d: Derivation) -> Middleware {
        let slot = self.slot.read();
        let handler = match &d {
            Derivation::Attrs(attrs) => slot.handler.with_attrs(attrs.clone()),
            Derivation::Group(name) => slot.handler.with_group(name),
        };
        let mut derivations = self.derivations.clone();
        derivations.push(d);
        Middleware {
            modifier_funcs: self.modifier_funcs.clone(),
            record_transformers: self.record_transformers.clone(),
            factory: Arc::clone(&self.factory),
            writer: self.writer.clone(),
            derivations,
            slot: RwLock::new(Slot { options: slot.options.clone(), handler }),
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("modifier_levels", &self.modifier_funcs.keys().collect::<Vec<_>>())
            .field("record_transformers", &self.record_transformers.len())
            .field("derivations", &self.derivations)
            .field("options", &self.slot.read().options)
            .finish()
    }
}

impl Handler for Middleware {
    fn enabled(&self, ctx: &Context, level: Level) -> bool {
        self.handler().enabled(ctx, level)
    }

    fn handle(&self, ctx: &Context, mut record: LogRecord) -> Result<(), HandlerError> {
        let mut handler = self.handler();
        if let Some(attrs) = ctx.attrs() {
            handler = handler.with_attrs(attrs.to_vec());
        }

        for t in &self.record_transformers {
            record = t(record);
        }
        // Callers filter on the level the record was created with; the
        // final level is checked here since a transformer may have moved it.
        if !handler.enabled(ctx, record.level) {
            return Ok(());
        }

        let modifier = self.modifier_funcs.get(&record.level).cloned();
        let _guard = self.writer.select(modifier);
        handler.handle(ctx, record)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(self.bind(attrs))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(self.group(name))
    }
}
