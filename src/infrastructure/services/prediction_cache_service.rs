//! Prediction caching service

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::cache::{CacheKey, CacheLookup, CacheStore, CacheStoreExt, CachedPrediction};
use crate::domain::DomainError;

/// Configuration for prediction caching
#[derive(Debug, Clone)]
pub struct PredictionCacheConfig {
    /// Namespace prefix for storage keys
    pub namespace: String,
    /// Whether caching is enabled
    pub enabled: bool,
}

impl Default for PredictionCacheConfig {
    fn default() -> Self {
        Self {
            namespace: "trip:predictions".to_string(),
            enabled: true,
        }
    }
}

impl PredictionCacheConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Disables caching
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Reads and writes predictions under `{namespace}:{model_version}:{digest}`.
///
/// Keys are scoped by model version so a redeployed model never serves
/// values computed by its predecessor. Store failures are returned to the
/// caller, which decides whether they are fatal.
#[derive(Debug, Clone)]
pub struct PredictionCacheService {
    cache: Arc<dyn CacheStore>,
    config: PredictionCacheConfig,
}

impl PredictionCacheService {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(cache, PredictionCacheConfig::default())
    }

    pub fn with_config(cache: Arc<dyn CacheStore>, config: PredictionCacheConfig) -> Self {
        Self { cache, config }
    }

    /// Full storage key for a request digest under a model version
    pub fn storage_key(&self, model_version: &str, key: &CacheKey) -> String {
        format!("{}:{}:{}", self.config.namespace, model_version, key)
    }

    /// Looks up a prediction; store errors become `CacheLookup::Unavailable`
    pub async fn lookup(&self, model_version: &str, key: &CacheKey) -> CacheLookup {
        if !self.config.enabled {
            return CacheLookup::Miss;
        }

        let storage_key = self.storage_key(model_version, key);

        match self.cache.get::<CachedPrediction>(&storage_key).await {
            Ok(Some(cached)) if cached.model_version == model_version => {
                debug!(cache_key = %key, "Prediction cache hit");
                CacheLookup::Found(cached)
            }
            Ok(Some(cached)) => {
                warn!(
                    cache_key = %key,
                    stored_version = %cached.model_version,
                    expected_version = %model_version,
                    "Ignoring cached prediction from another model version"
                );
                CacheLookup::Miss
            }
            Ok(None) => {
                debug!(cache_key = %key, "Prediction cache miss");
                CacheLookup::Miss
            }
            Err(e) => CacheLookup::Unavailable(e),
        }
    }

    /// Stores a prediction; a no-op when caching is disabled
    pub async fn store(&self, key: &CacheKey, entry: &CachedPrediction) -> Result<(), DomainError> {
        if !self.config.enabled {
            return Ok(());
        }

        let storage_key = self.storage_key(&entry.model_version, key);
        self.cache.set(&storage_key, entry).await
    }

    /// Verifies the underlying store is reachable
    pub async fn ping(&self) -> Result<(), DomainError> {
        self.cache.ping().await
    }

    pub fn backend(&self) -> &'static str {
        self.cache.backend()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}
