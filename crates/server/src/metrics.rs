//! Prometheus metrics for the update server.
//!
//! The `/metrics` endpoint is unauthenticated; restrict it at the network
//! level when enabled.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Manifest requests by outcome: `update`, `no_update`, `bad_request`, `not_found`.
pub static MANIFEST_REQUESTS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ota_manifest_requests_total",
            "Total manifest requests by outcome",
        ),
        &["outcome"],
    )
    .expect("metric creation failed")
});

/// Publish syncs by outcome: `created`, `failed`.
pub static PUBLISH_SYNCS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("ota_publish_syncs_total", "Total publish syncs by outcome"),
        &["outcome"],
    )
    .expect("metric creation failed")
});

pub static RESOLVE_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "ota_resolve_duration_seconds",
            "Time taken to resolve a manifest request",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry. Idempotent.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(MANIFEST_REQUESTS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(PUBLISH_SYNCS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(RESOLVE_DURATION.clone()))
            .expect("metric registration failed");
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}

pub fn record_manifest_outcome(outcome: &str) {
    MANIFEST_REQUESTS.with_label_values(&[outcome]).inc();
}

pub fn record_sync_outcome(outcome: &str) {
    PUBLISH_SYNCS.with_label_values(&[outcome]).inc();
}
