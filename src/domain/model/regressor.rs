//! Regression model and model source traits

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::features::FeatureVector;
use crate::domain::DomainError;

/// A loaded regression model.
///
/// Parameters are read-only after loading, so implementations are shared
/// across concurrent requests without locking.
pub trait Regressor: Send + Sync + Debug {
    /// Identifier of the trained artifact, e.g. `taxi_model:production`
    fn version(&self) -> &str;

    /// Number of inputs the model was trained on
    fn input_dimension(&self) -> usize;

    /// Training column names in input order; empty when the artifact omits them
    fn feature_names(&self) -> &[String];

    /// Computes a prediction for one feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f64, DomainError>;
}

/// Shared handle to a loaded model
pub type ModelHandle = Arc<dyn Regressor>;

/// Where the serving model comes from.
///
/// Called once at startup; the returned handle is never replaced.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Human readable location for logs
    fn describe(&self) -> String;

    async fn load_model(&self) -> Result<ModelHandle, DomainError>;
}
