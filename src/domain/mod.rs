//! Domain layer - Core prediction types and contracts

pub mod audit;
pub mod cache;
pub mod error;
pub mod features;
pub mod model;
pub mod trip;

pub use audit::{AuditLog, AuditRecord, AuditRecordId};
pub use cache::{
    CacheKey, CacheLookup, CacheStore, CacheStoreExt, CachedPrediction, RequestHasher,
};
pub use error::DomainError;
pub use features::{Feature, FeatureBuilder, FeatureSchema, FeatureVector};
pub use model::{ModelHandle, ModelInvoker, ModelSource, Regressor};
pub use trip::{TripRequest, TripRequestFields, TripValidationError};
