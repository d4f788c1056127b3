mod common;

use common::{parse_lines, SharedBuf};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_log_middleware::handler::HandlerOptions;
use tracing_log_middleware::json::JsonHandler;
use tracing_log_middleware::layer::MiddlewareLayer;
use tracing_log_middleware::level::Level;
use tracing_log_middleware::middleware::{Middleware, MiddlewareOptions};
use tracing_log_middleware::transform::convert_legacy_level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn middleware(buf: &SharedBuf, level: Level) -> Arc<Middleware> {
    Arc::new(Middleware::new(
        JsonHandler::new,
        MiddlewareOptions {
            record_transformers: vec![convert_legacy_level(
                Some(HashMap::from([("error".to_string(), Level::ERROR), ("debug".to_string(), Level::DEBUG)])),
                true,
            )],
            writer: Box::new(buf.clone()),
            handler_options: HandlerOptions { level, ..HandlerOptions::default() },
            ..MiddlewareOptions::default()
        },
    ))
}

#[test]
fn span_fields_become_context_attrs() {
    let buf = SharedBuf::default();
    let subscriber = Registry::default().with(MiddlewareLayer::new(middleware(&buf, Level::INFO)));

    tracing::subscriber::with_default(subscriber, || {
        let outer = tracing::info_span!("request", request_id = 12);
        let _outer = outer.enter();
        let inner = tracing::info_span!("db", table = "users");
        let _inner = inner.enter();
        tracing::warn!(rows = 3, "slow query");
    });

    assert_eq!(
        parse_lines(&buf.contents()),
        vec![json!({"level": "WARN", "msg": "slow query", "request_id": 12, "table": "users", "rows": 3})]
    );
}

#[test]
fn events_are_filtered_and_promoted() {
    let buf = SharedBuf::default();
    let layer = MiddlewareLayer::new(middleware(&buf, Level::INFO));
    let total = Arc::clone(&layer.total_events);
    let handled = Arc::clone(&layer.handled_events);
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("too quiet");
        tracing::info!("[error] disk full");
        tracing::info!("[debug] demoted");
        tracing::error!(code = 7u64, "failed");
    });

    assert_eq!(
        parse_lines(&buf.contents()),
        vec![
            json!({"level": "ERROR", "msg": "disk full"}),
            json!({"level": "ERROR", "msg": "failed", "code": 7}),
        ]
    );
    assert_eq!(total.load(Ordering::Relaxed), 4);
    // "[debug] demoted" is handed over but dropped below the threshold.
    assert_eq!(handled.load(Ordering::Relaxed), 3);
}

#[test]
fn span_fields_recorded_later_are_included() {
    let buf = SharedBuf::default();
    let subscriber = Registry::default().with(MiddlewareLayer::new(middleware(&buf, Level::INFO)));

    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("job", attempt = tracing::field::Empty);
        span.record("attempt", 2);
        let _g = span.enter();
        tracing::info!("retrying");
    });

    assert_eq!(
        parse_lines(&buf.contents()),
        vec![json!({"level": "INFO", "msg": "retrying", "attempt": 2})]
    );
}
