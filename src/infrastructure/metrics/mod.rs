//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - Active WebSocket connections
//! - Presence transitions by direction and reason
//! - Message submissions answered from an existing record
//! - Read receipts emitted
//! - Database query duration histograms

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "skillshare_chat";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// Active WebSocket connections gauge
pub static WEBSOCKET_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new(
            "websocket_connections_active",
            "Number of authenticated WebSocket connections",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create WEBSOCKET_CONNECTIONS_ACTIVE metric")
});

/// Presence transitions, e.g. `{to="offline", reason="sweep"}`
pub static PRESENCE_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("presence_transitions_total", "Online/offline transitions").namespace(NAMESPACE),
        &["to", "reason"],
    )
    .expect("Failed to create PRESENCE_TRANSITIONS_TOTAL metric")
});

/// Submissions resolved to an already persisted message
pub static MESSAGES_DEDUPLICATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "messages_deduplicated_total",
            "Message submissions answered with an existing message",
        )
        .namespace(NAMESPACE),
        &["matched_by"],
    )
    .expect("Failed to create MESSAGES_DEDUPLICATED_TOTAL metric")
});

/// Read receipt events emitted to senders
pub static READ_RECEIPTS_EMITTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("read_receipts_emitted_total", "messages_read events emitted").namespace(NAMESPACE),
    )
    .expect("Failed to create READ_RECEIPTS_EMITTED_TOTAL metric")
});

/// Database query duration histogram
pub static DB_QUERY_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];
    HistogramVec::new(
        HistogramOpts::new(
            "db_query_duration_seconds",
            "Database query latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["operation", "table"],
    )
    .expect("Failed to create DB_QUERY_DURATION_SECONDS metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(WEBSOCKET_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register WEBSOCKET_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(PRESENCE_TRANSITIONS_TOTAL.clone()))
        .expect("Failed to register PRESENCE_TRANSITIONS_TOTAL");
    registry
        .register(Box::new(MESSAGES_DEDUPLICATED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_DEDUPLICATED_TOTAL");
    registry
        .register(Box::new(READ_RECEIPTS_EMITTED_TOTAL.clone()))
        .expect("Failed to register READ_RECEIPTS_EMITTED_TOTAL");
    registry
        .register(Box::new(DB_QUERY_DURATION_SECONDS.clone()))
        .expect("Failed to register DB_QUERY_DURATION_SECONDS");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_db_query(operation: &str, table: &str, duration_secs: f64) {
    DB_QUERY_DURATION_SECONDS
        .with_label_values(&[operation, table])
        .observe(duration_secs);
}

pub fn record_presence_transition(to: &str, reason: &str) {
    PRESENCE_TRANSITIONS_TOTAL.with_label_values(&[to, reason]).inc();
}

pub fn record_deduplicated(matched_by: &str) {
    MESSAGES_DEDUPLICATED_TOTAL.with_label_values(&[matched_by]).inc();
}

pub fn record_read_receipts(emitted: usize) {
    READ_RECEIPTS_EMITTED_TOTAL.inc_by(emitted as u64);
}

pub fn set_websocket_connections(active: usize) {
    WEBSOCKET_CONNECTIONS_ACTIVE.set(active as i64);
}
