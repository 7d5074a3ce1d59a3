//! Prediction request and response types

use serde::{Deserialize, Serialize};

use crate::domain::AuditRecord;
use crate::infrastructure::services::PredictionOutcome;

/// Default number of records returned by the recent-predictions endpoint
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Upper bound for the recent-predictions `limit` parameter
pub const MAX_RECENT_LIMIT: usize = 500;

/// Response body for a served prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: f64,
    pub cached: bool,
    /// Serve time, RFC 3339 UTC
    pub timestamp: String,
    pub model_version: String,
}

impl From<PredictionOutcome> for PredictResponse {
    fn from(outcome: PredictionOutcome) -> Self {
        Self {
            prediction: outcome.prediction,
            cached: outcome.cached,
            timestamp: outcome
                .served_at
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            model_version: outcome.model_version,
        }
    }
}

/// Query string for the recent-predictions endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

impl RecentQuery {
    /// Requested limit, defaulted and clamped to `1..=MAX_RECENT_LIMIT`
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT)
    }
}

/// List of recent audit records, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentPredictionsResponse {
    pub object: String,
    pub data: Vec<AuditRecord>,
}

impl RecentPredictionsResponse {
    pub fn new(data: Vec<AuditRecord>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}
