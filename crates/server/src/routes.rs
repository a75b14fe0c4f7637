//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        // Health checks for load balancers and orchestrators
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .route("/health-check", get(handlers::health_check))
        // Device-facing update endpoint
        .route("/api/manifest", get(handlers::get_manifest))
        // Publish pipeline
        .route("/get-upload-path", get(handlers::get_upload_path))
        .route("/sync-with-db", get(handlers::sync_with_db));

    // The metrics endpoint is unauthenticated; restrict it at the network level.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
