//! Linear regression model loaded from a JSON artifact

use serde::{Deserialize, Serialize};

use crate::domain::features::FeatureVector;
use crate::domain::model::Regressor;
use crate::domain::DomainError;

/// Transform applied to the raw linear output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    #[default]
    Identity,
    /// Model was fit on `ln(1 + y)`; serving inverts with `expm1`
    Log1p,
}

impl TargetTransform {
    pub fn invert(self, raw: f64) -> f64 {
        match self {
            TargetTransform::Identity => raw,
            TargetTransform::Log1p => raw.exp_m1(),
        }
    }
}

/// On-disk model format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub version: String,
    #[serde(default)]
    pub features: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub target_transform: TargetTransform,
}

/// `intercept + coefficients · x`, optionally inverse-transformed
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    version: String,
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    target_transform: TargetTransform,
}

impl LinearRegressor {
    /// Validates an artifact and builds the model
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, DomainError> {
        if artifact.version.trim().is_empty() {
            return Err(DomainError::configuration("Model artifact has an empty version"));
        }

        if artifact.coefficients.is_empty() {
            return Err(DomainError::configuration(format!(
                "Model '{}' has no coefficients",
                artifact.version
            )));
        }

        if !artifact.features.is_empty() && artifact.features.len() != artifact.coefficients.len()
        {
            return Err(DomainError::configuration(format!(
                "Model '{}' names {} features but has {} coefficients",
                artifact.version,
                artifact.features.len(),
                artifact.coefficients.len()
            )));
        }

        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite())
        {
            return Err(DomainError::configuration(format!(
                "Model '{}' has non-finite parameters",
                artifact.version
            )));
        }

        Ok(Self {
            version: artifact.version,
            feature_names: artifact.features,
            coefficients: artifact.coefficients,
            intercept: artifact.intercept,
            target_transform: artifact.target_transform,
        })
    }

    pub fn target_transform(&self) -> TargetTransform {
        self.target_transform
    }
}

impl Regressor for LinearRegressor {
    fn version(&self) -> &str {
        &self.version
    }

    fn input_dimension(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, DomainError> {
        if features.len() != self.coefficients.len() {
            return Err(DomainError::internal(format!(
                "Expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let raw = self
            .coefficients
            .iter()
            .zip(features.as_slice())
            .fold(self.intercept, |acc, (c, x)| acc + c * x);

        Ok(self.target_transform.invert(raw))
    }
}
