use crate::error::InitError;
use crate::handler::Handler;
use crate::layer::MiddlewareLayer;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the installed subscriber.
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top of [`MiddlewareLayer`] so events are also printed by
///   the stock formatter.
#[derive(Clone, Debug, Default)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

/// Install a global `tracing` subscriber that routes every event through
/// `handler` (usually a [`Middleware`](crate::middleware::Middleware)).
///
/// **Parameters**
/// - `handler`: receives the [`LogRecord`](crate::record::LogRecord)s
///   built from events.
/// - `config`: [`LayerConfig`] controlling extra layers.
///
/// **Returns**
/// - `Err(InitError::AlreadySet)` if a global subscriber was installed earlier.
pub fn init_tracing_with_config(handler: Arc<dyn Handler>, config: LayerConfig) -> Result<(), InitError> {
    let layer = MiddlewareLayer::new(handler);

    // The layer stacks differ in type, so each branch installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(handler: Arc<dyn Handler>) -> Result<(), InitError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
