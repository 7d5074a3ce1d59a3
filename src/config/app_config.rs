use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::audit::{AuditConfig as AuditStoreConfig, AuditType};
use crate::infrastructure::cache::{CacheConfig as CacheStoreConfig, CacheType};
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::services::PredictionCacheConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub audit: AuditSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Prediction cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// `in_memory` or `redis`
    #[serde(default = "default_cache_backend")]
    pub backend: String,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub key_prefix: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Absent means entries never expire
    #[serde(default)]
    pub ttl_secs: Option<u64>,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub fallback_to_memory: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Audit log settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSettings {
    /// `auto`, `in_memory`, `file` or `postgres`
    #[serde(default = "default_audit_backend")]
    pub backend: String,
    #[serde(default = "default_audit_file")]
    pub file_path: PathBuf,
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_audit_table")]
    pub table: String,
    /// Write records the primary log rejected to `file_path`
    #[serde(default)]
    pub mirror_to_file: bool,
    /// Use the file log when PostgreSQL is unreachable at startup
    #[serde(default = "default_true")]
    pub fallback_to_file: bool,
    #[serde(default = "default_audit_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Serving model settings
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// Refuse to start when the artifact cannot be loaded
    #[serde(default)]
    pub required: bool,
    /// Ordered feature names; defaults to the artifact's own list
    #[serde(default)]
    pub feature_schema: Option<Vec<String>>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cache_backend() -> String {
    "in_memory".to_string()
}

fn default_namespace() -> String {
    "trip:predictions".to_string()
}

fn default_max_capacity() -> u64 {
    100_000
}

fn default_operation_timeout_ms() -> u64 {
    250
}

fn default_true() -> bool {
    true
}

fn default_audit_backend() -> String {
    "auto".to_string()
}

fn default_audit_file() -> PathBuf {
    PathBuf::from("data/prediction_log.jsonl")
}

fn default_audit_table() -> String {
    "prediction_logs".to_string()
}

fn default_audit_connect_timeout_secs() -> u64 {
    5
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/model.json")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            redis_url: None,
            key_prefix: None,
            namespace: default_namespace(),
            ttl_secs: None,
            max_capacity: default_max_capacity(),
            operation_timeout_ms: default_operation_timeout_ms(),
            fallback_to_memory: true,
            enabled: true,
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            backend: default_audit_backend(),
            file_path: default_audit_file(),
            database_url: None,
            table: default_audit_table(),
            mirror_to_file: false,
            fallback_to_file: true,
            connect_timeout_secs: default_audit_connect_timeout_secs(),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            required: false,
            feature_schema: None,
        }
    }
}

impl CacheSettings {
    /// Store configuration for the cache factory
    pub fn store_config(&self) -> Result<CacheStoreConfig, crate::domain::DomainError> {
        let cache_type: CacheType = self.backend.parse()?;

        Ok(CacheStoreConfig {
            cache_type,
            redis_url: self.redis_url.clone(),
            key_prefix: self.key_prefix.clone(),
            time_to_live: self.ttl_secs.map(Duration::from_secs),
            max_capacity: self.max_capacity,
            operation_timeout: Duration::from_millis(self.operation_timeout_ms),
            fallback_to_memory: self.fallback_to_memory,
        })
    }

    pub fn service_config(&self) -> PredictionCacheConfig {
        let config = PredictionCacheConfig::default().with_namespace(self.namespace.clone());

        if self.enabled {
            config
        } else {
            config.disabled()
        }
    }
}

impl AuditSettings {
    /// Store configuration for the audit factory
    pub fn store_config(&self) -> Result<AuditStoreConfig, crate::domain::DomainError> {
        let audit_type: AuditType = self.backend.parse()?;

        Ok(AuditStoreConfig {
            audit_type,
            file_path: self.file_path.clone(),
            database_url: self.database_url.clone().filter(|url| !url.is_empty()),
            table: self.table.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            fallback_to_file: self.fallback_to_file,
        })
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("model.feature_schema")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.cache.namespace, "trip:predictions");
        assert!(config.cache.ttl_secs.is_none());
        assert_eq!(config.audit.file_path, PathBuf::from("data/prediction_log.jsonl"));
        assert_eq!(config.model.artifact_path, PathBuf::from("models/model.json"));
        assert!(!config.model.required);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_sections_deserialize() {
        let json = r#"{
            "cache": {"backend": "redis", "redis_url": "redis://cache:6379", "ttl_secs": 600},
            "logging": {"format": "json"},
            "model": {"feature_schema": ["pickup_lat", "pickup_lon"]}
        }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.cache.max_capacity, 100_000);
        assert_eq!(config.model.feature_schema.as_ref().map(Vec::len), Some(2));

        let store = config.cache.store_config().unwrap();
        assert_eq!(store.cache_type, CacheType::Redis);
        assert_eq!(store.time_to_live, Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_unknown_backends_are_rejected() {
        let cache = CacheSettings {
            backend: "dynamodb".to_string(),
            ..Default::default()
        };
        assert!(cache.store_config().is_err());

        let audit = AuditSettings {
            backend: "s3".to_string(),
            ..Default::default()
        };
        assert!(audit.store_config().is_err());
    }

    #[test]
    fn test_empty_database_url_means_file_log() {
        let audit = AuditSettings {
            database_url: Some(String::new()),
            ..Default::default()
        };

        assert_eq!(audit.store_config().unwrap().resolved_type(), AuditType::File);
    }

    #[test]
    fn test_audit_falls_back_to_file_by_default() {
        let store = AuditSettings::default().store_config().unwrap();

        assert!(store.fallback_to_file);
        assert_eq!(store.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_disabled_cache_service_config() {
        let cache = CacheSettings {
            enabled: false,
            ..Default::default()
        };

        assert!(!cache.service_config().enabled);
    }
}
