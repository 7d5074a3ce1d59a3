//! Model invocation with load-state and dimension checks

use crate::domain::features::{FeatureSchema, FeatureVector};
use crate::domain::DomainError;

use super::regressor::ModelHandle;

/// Wraps the optional serving model.
///
/// Without a model every prediction fails with `ModelUnavailable`, which the
/// API reports as service-unavailable while liveness keeps answering.
#[derive(Debug, Clone, Default)]
pub struct ModelInvoker {
    model: Option<ModelHandle>,
}

impl ModelInvoker {
    pub fn new(model: ModelHandle) -> Self {
        Self { model: Some(model) }
    }

    pub fn unloaded() -> Self {
        Self { model: None }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn version(&self) -> Option<&str> {
        self.model.as_ref().map(|model| model.version())
    }

    /// Returns the loaded model or `ModelUnavailable`
    pub fn model(&self) -> Result<&ModelHandle, DomainError> {
        self.model
            .as_ref()
            .ok_or_else(|| DomainError::model_unavailable("No model is loaded"))
    }

    /// Runs the model on one feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, DomainError> {
        let model = self.model()?;

        if features.len() != model.input_dimension() {
            return Err(DomainError::internal(format!(
                "Feature vector has {} values but model '{}' expects {}",
                features.len(),
                model.version(),
                model.input_dimension()
            )));
        }

        let prediction = model.predict(features)?;

        if !prediction.is_finite() {
            return Err(DomainError::internal(format!(
                "Model '{}' returned a non-finite prediction",
                model.version()
            )));
        }

        Ok(prediction)
    }

    /// Startup self-check that the schema matches the loaded model.
    ///
    /// Length must equal the model input dimension and, when the artifact names
    /// its inputs, names must match in order. Passes trivially without a model.
    pub fn verify_schema(&self, schema: &FeatureSchema) -> Result<(), DomainError> {
        let Some(model) = &self.model else {
            return Ok(());
        };

        if schema.len() != model.input_dimension() {
            return Err(DomainError::configuration(format!(
                "Feature schema {} has {} features but model '{}' expects {}",
                schema,
                schema.len(),
                model.version(),
                model.input_dimension()
            )));
        }

        let names = model.feature_names();

        if names.is_empty() {
            return Ok(());
        }

        let expected = FeatureSchema::from_names(names)?;

        if &expected != schema {
            return Err(DomainError::configuration(format!(
                "Feature schema {} does not match model '{}' inputs {}",
                schema,
                model.version(),
                expected
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::fixtures::SumRegressor;
    use std::sync::Arc;

    #[test]
    fn test_unloaded_invoker_is_unavailable() {
        let invoker = ModelInvoker::unloaded();

        assert!(!invoker.is_loaded());
        assert!(invoker.version().is_none());

        let err = invoker
            .predict(&FeatureVector::new(vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, DomainError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_predict() {
        let invoker = ModelInvoker::new(Arc::new(SumRegressor::new(2)));

        let prediction = invoker.predict(&FeatureVector::new(vec![10.0, 20.0])).unwrap();
        assert!((prediction - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_is_internal() {
        let invoker = ModelInvoker::new(Arc::new(SumRegressor::new(3)));

        let err = invoker.predict(&FeatureVector::new(vec![1.0])).unwrap_err();
        assert!(matches!(err, DomainError::Internal { .. }));
    }

    #[test]
    fn test_verify_schema_length() {
        let invoker = ModelInvoker::new(Arc::new(SumRegressor::new(7)));

        assert!(invoker.verify_schema(&FeatureSchema::trip_duration()).is_ok());

        let err = invoker
            .verify_schema(&FeatureSchema::serving_default())
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }

    #[test]
    fn test_verify_schema_names_and_order() {
        let model = SumRegressor::new(0).with_names(&[
            "pickup_latitude",
            "pickup_longitude",
            "dropoff_latitude",
            "dropoff_longitude",
            "passenger_count",
            "trip_distance",
        ]);
        let invoker = ModelInvoker::new(Arc::new(model));

        assert!(invoker.verify_schema(&FeatureSchema::serving_default()).is_ok());

        let swapped = FeatureSchema::from_names([
            "pickup_longitude",
            "pickup_latitude",
            "dropoff_latitude",
            "dropoff_longitude",
            "passenger_count",
            "trip_distance",
        ])
        .unwrap();
        assert!(invoker.verify_schema(&swapped).is_err());
    }

    #[test]
    fn test_verify_schema_without_model() {
        assert!(ModelInvoker::unloaded()
            .verify_schema(&FeatureSchema::serving_default())
            .is_ok());
    }
}
