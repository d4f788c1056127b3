use crate::attr::{Attr, Value};
use crate::context::Context;
use crate::error::HandlerError;
use crate::level::Level;
use crate::record::LogRecord;
use chrono::SecondsFormat;
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const MESSAGE_KEY: &str = "msg";
pub const SOURCE_KEY: &str = "source";

/// Rewrites (or drops, by returning `None`) a single non-group attribute
/// before it is rendered. The slice holds the names of the enclosing groups.
pub type ReplaceAttrFn = Arc<dyn Fn(&[String], Attr) -> Option<Attr> + Send + Sync>;

/// Configuration shared by the built-in renderers.
#[derive(Clone)]
pub struct HandlerOptions {
    /// Minimum level a record needs to be rendered.
    pub level: Level,
    /// Render the call site when the record carries one.
    pub add_source: bool,
    pub replace_attr: Option<ReplaceAttrFn>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self { level: Level::INFO, add_source: false, replace_attr: None }
    }
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("level", &self.level)
            .field("add_source", &self.add_source)
            .field("replace_attr", &self.replace_attr.is_some())
            .finish()
    }
}

/// Destination for rendered records.
///
/// Implementations decide which levels they accept, render records, and
/// can be specialised with bound attributes or an open group. Derivation
/// never mutates the receiver.
pub trait Handler: Send + Sync {
    /// Whether a record at `level` would be handled at all.
    fn enabled(&self, ctx: &Context, level: Level) -> bool;

    /// Render and emit one record.
    ///
    /// **Returns**
    /// - `Ok(())` once the record was written (or deliberately dropped).
    /// - `Err(..)` if rendering or the underlying writer failed.
    fn handle(&self, ctx: &Context, record: LogRecord) -> Result<(), HandlerError>;

    /// A handler that renders `attrs` with every record.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// A handler that nests all later attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}

/// Writer shared between a handler and the handlers derived from it.
pub(crate) type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

pub(crate) fn shared_writer(w: impl Write + Send + 'static) -> SharedWriter {
    Arc::new(Mutex::new(Box::new(w)))
}

/// Bound attributes and open groups common to the built-in renderers.
#[derive(Clone, Debug)]
pub(crate) struct HandlerState {
    pub(crate) opts: HandlerOptions,
    groups: Vec<String>,
    // bound[0] is top level, bound[i + 1] lives inside groups[i].
    bound: Vec<Vec<Attr>>,
}

impl HandlerState {
    pub(crate) fn new(opts: HandlerOptions) -> Self {
        HandlerState { opts, groups: Vec::new(), bound: vec![Vec::new()] }
    }

    pub(crate) fn enabled(&self, level: Level) -> bool {
        level >= self.opts.level
    }

    pub(crate) fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        let mut next = self.clone();
        if let Some(last) = next.bound.last_mut() {
            last.extend(attrs);
        }
        next
    }

    pub(crate) fn with_group(&self, name: &str) -> Self {
        let mut next = self.clone();
        if !name.is_empty() {
            next.groups.push(name.to_string());
            next.bound.push(Vec::new());
        }
        next
    }

    /// Flattens header, bound attributes, open groups and the record's own
    /// attributes into the top-level attribute list to render.
    pub(crate) fn layout(&self, record: &LogRecord) -> Vec<Attr> {
        let mut out = Vec::with_capacity(4 + self.bound[0].len() + record.attrs.len());

        let mut header = vec![
            Attr::new(TIME_KEY, record.time.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Attr::new(LEVEL_KEY, record.level.to_string()),
            Attr::new(MESSAGE_KEY, record.message.clone()),
        ];
        if self.opts.add_source {
            if let Some(src) = &record.source {
                let mut fields = vec![Attr::new("file", src.file.clone()), Attr::uint("line", src.line as u64)];
                if let Some(module) = &src.module_path {
                    fields.push(Attr::new("module", module.clone()));
                }
                header.push(Attr::group(SOURCE_KEY, fields));
            }
        }
        for a in header {
            if let Some(a) = self.replace(&[], a) {
                out.push(a);
            }
        }

        let mut inner = self.resolve(&self.groups, record.attrs.clone());
        for depth in (0..self.groups.len()).rev() {
            let mut content = self.resolve(&self.groups[..=depth], self.bound[depth + 1].clone());
            content.append(&mut inner);
            if !content.is_empty() {
                inner = vec![Attr::group(self.groups[depth].clone(), content)];
            }
        }
        out.extend(self.resolve(&[], self.bound[0].clone()));
        out.append(&mut inner);
        out
    }

    fn replace(&self, groups: &[String], attr: Attr) -> Option<Attr> {
        match &self.opts.replace_attr {
            Some(f) => f(groups, attr),
            None => Some(attr),
        }
    }

    // Applies the replacement hook, inlines groups with an empty key and
    // omits empty groups.
    fn resolve(&self, groups: &[String], attrs: Vec<Attr>) -> Vec<Attr> {
        let mut out = Vec::with_capacity(attrs.len());
        for a in attrs {
            match a.value {
                Value::Group(children) => {
                    if a.key.is_empty() {
                        out.extend(self.resolve(groups, children));
                        continue;
                    }
                    let mut path = groups.to_vec();
                    path.push(a.key.clone());
                    let children = self.resolve(&path, children);
                    if !children.is_empty() {
                        out.push(Attr::group(a.key, children));
                    }
                }
                value => {
                    if let Some(a) = self.replace(groups, Attr { key: a.key, value }) {
                        out.push(a);
                    }
                }
            }
        }
        out
    }
}
