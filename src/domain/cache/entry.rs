//! Cached prediction values and lookup outcomes

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Value stored under a prediction cache key.
///
/// Holds nothing that changes between writes, so rewriting an entry for the
/// same key and model version leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPrediction {
    pub prediction: f64,
    pub model_version: String,
}

impl CachedPrediction {
    pub fn new(prediction: f64, model_version: impl Into<String>) -> Self {
        Self {
            prediction,
            model_version: model_version.into(),
        }
    }
}

/// Outcome of a cache lookup.
///
/// A miss is a normal result; `Unavailable` carries the store failure so the
/// caller can log it and continue as if it were a miss.
#[derive(Debug)]
pub enum CacheLookup {
    Found(CachedPrediction),
    Miss,
    Unavailable(DomainError),
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Found(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLookup::Found(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Unavailable(_) => "unavailable",
        }
    }
}
