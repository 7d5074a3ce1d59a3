//! Trip Predict Gateway
//!
//! Serves trip duration / fare predictions from a pre-trained regression
//! model with:
//! - Cache-aside lookups keyed by a canonical hash of the request
//! - Fail-open cache and audit stores (in-memory, Redis, file, PostgreSQL)
//! - An append-only audit log of every served prediction

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use api::state::AppState;
use config::ModelSettings;
use domain::{DomainError, FeatureBuilder, FeatureSchema, ModelInvoker, ModelSource};
use infrastructure::audit::AuditFactory;
use infrastructure::cache::CacheFactory;
use infrastructure::model::FileModelSource;
use infrastructure::services::{AuditService, PredictionCacheService, PredictionService};
use std::sync::Arc;
use tracing::{info, warn};

/// Loads the model artifact named in `settings`.
///
/// A missing artifact leaves the invoker unloaded unless the model is
/// required. A present but invalid artifact is always an error.
pub async fn load_model(settings: &ModelSettings) -> Result<ModelInvoker, DomainError> {
    let source = FileModelSource::new(settings.artifact_path.clone());

    match source.load_model().await {
        Ok(model) => Ok(ModelInvoker::new(model)),
        Err(DomainError::ModelUnavailable { message }) if !settings.required => {
            warn!(
                source = %source.describe(),
                error = %message,
                "Starting without a model; predictions will be rejected"
            );
            Ok(ModelInvoker::unloaded())
        }
        Err(e) => Err(e),
    }
}

/// Picks the feature schema: configured list, then the artifact's own
/// feature names, then the serving default.
pub fn resolve_schema(
    settings: &ModelSettings,
    invoker: &ModelInvoker,
) -> Result<FeatureSchema, DomainError> {
    if let Some(names) = &settings.feature_schema {
        return FeatureSchema::from_names(names);
    }

    if let Ok(model) = invoker.model() {
        if !model.feature_names().is_empty() {
            return FeatureSchema::from_names(model.feature_names());
        }
    }

    Ok(FeatureSchema::serving_default())
}

/// Builds the prediction pipeline from configuration.
///
/// Fails when the feature schema does not match the loaded model.
pub async fn build_prediction_service(config: &AppConfig) -> anyhow::Result<PredictionService> {
    let invoker = load_model(&config.model).await?;
    let schema = resolve_schema(&config.model, &invoker)?;
    invoker.verify_schema(&schema)?;

    info!(
        schema = %schema,
        model_version = invoker.version().unwrap_or("none"),
        "Feature schema resolved"
    );

    let cache_store = CacheFactory::new()
        .create(&config.cache.store_config()?)
        .await?;
    let cache = PredictionCacheService::with_config(cache_store, config.cache.service_config());

    let audit_factory = AuditFactory::new();
    let audit_config = config.audit.store_config()?;
    let primary = audit_factory.create(&audit_config).await?;
    let mut audit = AuditService::new(primary.clone());

    if config.audit.mirror_to_file && primary.backend() != "file" {
        let mirror = audit_factory.create_file(&audit_config).await?;
        info!(path = %audit_config.file_path.display(), "Mirroring failed audit appends to file");
        audit = audit.with_mirror(mirror);
    }

    Ok(PredictionService::new(
        FeatureBuilder::new(schema),
        invoker,
        cache,
        audit,
    ))
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let service = build_prediction_service(config).await?;
    Ok(AppState::new(Arc::new(service)))
}
