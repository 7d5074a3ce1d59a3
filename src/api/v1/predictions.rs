//! Audit listing endpoint handler

use axum::extract::{Query, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, RecentPredictionsResponse, RecentQuery};

/// GET /v1/predictions/recent
pub async fn list_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentPredictionsResponse>, ApiError> {
    let limit = query.effective_limit();
    debug!(limit, "Listing recent predictions");

    let records = state.prediction_service.recent(limit).await?;

    Ok(Json(RecentPredictionsResponse::new(records)))
}
