//! Health and readiness endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::api::types::Json;
use crate::infrastructure::services::DependencyStatus;

use super::state::AppState;

/// Basic service status for `/health`
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    pub version: String,
}

/// Detailed readiness response with component status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthCheck {
    /// Cache and audit are fail-open, so an outage only degrades the service
    fn from_dependency(name: &str, status: DependencyStatus) -> Self {
        let health = if status.is_ok() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };

        Self {
            name: name.to_string(),
            status: health,
            backend: Some(status.backend),
            message: status.error,
        }
    }
}

/// Service status and whether a model is loaded.
///
/// Always 200 while the process is serving HTTP.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.prediction_service;

    let response = ServiceStatus {
        status: "ok",
        model_loaded: service.model_loaded(),
        model_version: service.model_version(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check with dependency verification
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let report = state.prediction_service.check_dependencies().await;

    let model_check = HealthCheck {
        name: "model".to_string(),
        status: if report.model_loaded {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        },
        backend: None,
        message: report
            .model_version
            .clone()
            .or_else(|| Some("model not loaded".to_string())),
    };

    let checks = vec![
        model_check,
        HealthCheck::from_dependency("cache", report.cache),
        HealthCheck::from_dependency("audit", report.audit),
    ];

    let overall_status = checks
        .iter()
        .map(|check| check.status)
        .fold(HealthStatus::Healthy, worst);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check - simple check to verify the service is running
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn worst(a: HealthStatus, b: HealthStatus) -> HealthStatus {
    match (a, b) {
        (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
        (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
        _ => HealthStatus::Healthy,
    }
}
