//! Infrastructure services

mod audit_service;
mod prediction_cache_service;
mod prediction_service;

pub use audit_service::AuditService;
pub use prediction_cache_service::{PredictionCacheConfig, PredictionCacheService};
pub use prediction_service::{
    DependencyReport, DependencyStatus, PredictionOutcome, PredictionService,
    PredictionServiceTrait,
};
