//! Audit record entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cache::CacheKey;
use crate::domain::trip::TripRequest;

/// Audit record ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditRecordId(String);

impl AuditRecordId {
    pub fn generate() -> Self {
        Self(format!("pred-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuditRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One served prediction.
///
/// Records are append-only: written once per request, hit or miss, and never
/// updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: AuditRecordId,
    pub request: TripRequest,
    pub prediction: f64,
    pub cache_hit: bool,
    pub cache_key: CacheKey,
    pub model_version: String,
    pub served_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        request: TripRequest,
        prediction: f64,
        cache_hit: bool,
        cache_key: CacheKey,
        model_version: impl Into<String>,
        served_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AuditRecordId::generate(),
            request,
            prediction,
            cache_hit,
            cache_key,
            model_version: model_version.into(),
            served_at,
        }
    }

    pub fn user_id(&self) -> &str {
        self.request.user_id()
    }
}
