use crate::attr::{args_to_attrs, Arg, Attr};
use std::sync::Arc;

/// Request-scoped values passed alongside each record.
///
/// A `Context` is immutable and cheap to clone. Deriving a child with
/// [`Context::with_attrs`] appends to the parent's attribute list; nothing
/// is ever removed, so to drop attributes derive from an ancestor instead.
#[derive(Debug, Clone, Default)]
pub struct Context {
    attrs: Option<Arc<[Attr]>>,
}

impl Context {
    /// The root context, carrying no attributes.
    pub fn background() -> Self {
        Context::default()
    }

    /// Derives a context whose attributes are this context's followed by `args`.
    pub fn with_attrs(&self, args: Vec<Arg>) -> Context {
        let added = args_to_attrs(args);
        let mut attrs = Vec::with_capacity(self.attrs.as_ref().map_or(0, |a| a.len()) + added.len());
        if let Some(parent) = &self.attrs {
            attrs.extend_from_slice(parent);
        }
        attrs.extend(added);
        Context { attrs: Some(attrs.into()) }
    }

    /// Attributes bound to this context, or `None` when no ancestor ever
    /// called [`with_attrs`](Context::with_attrs).
    pub fn attrs(&self) -> Option<&[Attr]> {
        self.attrs.as_deref()
    }
}

/// Free-function form of [`Context::with_attrs`].
pub fn with(ctx: &Context, args: Vec<Arg>) -> Context {
    ctx.with_attrs(args)
}

/// Free-function form of [`Context::attrs`].
pub fn attrs_from_context(ctx: &Context) -> Option<&[Attr]> {
    ctx.attrs()
}
