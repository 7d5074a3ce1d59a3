//! Loads the serving model from a local artifact file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::model::{ModelHandle, ModelSource, Regressor};
use crate::domain::DomainError;

use super::linear::{LinearModelArtifact, LinearRegressor};

/// Reads a JSON linear-model artifact from disk.
///
/// A missing file is `ModelUnavailable` (the service may start without a
/// model); a file that exists but cannot be parsed or validated is a
/// `Configuration` error.
#[derive(Debug, Clone)]
pub struct FileModelSource {
    path: PathBuf,
}

impl FileModelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ModelSource for FileModelSource {
    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }

    async fn load_model(&self) -> Result<ModelHandle, DomainError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DomainError::model_unavailable(format!(
                    "Model artifact not found at {}",
                    self.path.display()
                )),
                _ => DomainError::model_unavailable(format!(
                    "Failed to read model artifact {}: {}",
                    self.path.display(),
                    e
                )),
            })?;

        let artifact: LinearModelArtifact = serde_json::from_str(&contents).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid model artifact {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let model = LinearRegressor::from_artifact(artifact)?;

        info!(
            path = %self.path.display(),
            version = %model.version(),
            transform = ?model.target_transform(),
            "Loaded model artifact"
        );

        Ok(Arc::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_valid_artifact() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version":"taxi_model:production","features":["pickup_lat","pickup_lon","dropoff_lat","dropoff_lon","passenger_count","trip_distance"],"coefficients":[0,0,0,0,1,60],"intercept":30,"target_transform":"identity"}}"#
        )
        .unwrap();

        let model = FileModelSource::new(file.path()).load_model().await.unwrap();

        assert_eq!(model.version(), "taxi_model:production");
        assert_eq!(model.input_dimension(), 6);
        assert_eq!(model.feature_names()[0], "pickup_lat");
    }

    #[tokio::test]
    async fn test_missing_artifact_is_model_unavailable() {
        let source = FileModelSource::new("/nonexistent/model.json");

        let err = source.load_model().await.unwrap_err();
        assert!(matches!(err, DomainError::ModelUnavailable { .. }));
        assert!(source.describe().starts_with("file://"));
    }

    #[tokio::test]
    async fn test_corrupt_artifact_is_configuration_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = FileModelSource::new(file.path())
            .load_model()
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Configuration { .. }));
    }
}
