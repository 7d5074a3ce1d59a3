use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;

/// Default path for the Prometheus scrape endpoint
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Create the full router with application state.
///
/// When `metrics` is given, its exporter is served at `/metrics`.
pub fn create_router_with_state(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    create_router_with_metrics_path(state, metrics, DEFAULT_METRICS_PATH)
}

/// Same as [`create_router_with_state`] with a custom scrape path
pub fn create_router_with_metrics_path(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Unversioned alias kept for existing clients
        .route("/predict", post(v1::predict::predict))
        .nest("/v1", v1::create_v1_router())
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics, metrics_path));
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
