//! Prediction endpoint handler

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, PredictResponse};
use crate::domain::{TripRequest, TripRequestFields};

/// POST /v1/predict (also served at /predict)
pub async fn predict(
    State(state): State<AppState>,
    Json(fields): Json<TripRequestFields>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request = TripRequest::try_from(fields)?;
    debug!(user_id = %request.user_id(), "Prediction requested");

    let outcome = state.prediction_service.predict(request).await?;

    Ok(Json(PredictResponse::from(outcome)))
}
