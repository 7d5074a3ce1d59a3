//! Versioned prediction API endpoints

pub mod predict;
pub mod predictions;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict::predict))
        .route("/predictions/recent", get(predictions::list_recent))
}
