//! Audit log factory for runtime selection

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::audit::AuditLog;
use crate::domain::DomainError;

use super::file::FileAuditLog;
use super::in_memory::InMemoryAuditLog;
use super::postgres::{PostgresAuditConfig, PostgresAuditLog};

/// Supported audit backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditType {
    /// PostgreSQL when a database URL is configured, otherwise the file log
    #[default]
    Auto,
    InMemory,
    File,
    Postgres,
}

impl std::fmt::Display for AuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditType::Auto => write!(f, "auto"),
            AuditType::InMemory => write!(f, "in_memory"),
            AuditType::File => write!(f, "file"),
            AuditType::Postgres => write!(f, "postgres"),
        }
    }
}

impl std::str::FromStr for AuditType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(AuditType::Auto),
            "in_memory" | "inmemory" | "memory" => Ok(AuditType::InMemory),
            "file" | "jsonl" => Ok(AuditType::File),
            "postgres" | "postgresql" | "pg" => Ok(AuditType::Postgres),
            _ => Err(DomainError::configuration(format!(
                "Unknown audit backend: {}. Valid backends: auto, in_memory, file, postgres",
                s
            ))),
        }
    }
}

/// Configuration for audit factory
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub audit_type: AuditType,
    /// JSONL file location (file backend and mirror)
    pub file_path: PathBuf,
    /// PostgreSQL URL (required for the postgres backend)
    pub database_url: Option<String>,
    /// PostgreSQL table name
    pub table: String,
    /// PostgreSQL pool acquire timeout
    pub connect_timeout: Duration,
    /// Use the file log when PostgreSQL is unreachable at startup
    pub fallback_to_file: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            audit_type: AuditType::Auto,
            file_path: PathBuf::from("data/prediction_log.jsonl"),
            database_url: None,
            table: "prediction_logs".to_string(),
            connect_timeout: Duration::from_secs(5),
            fallback_to_file: true,
        }
    }
}

impl AuditConfig {
    pub fn in_memory() -> Self {
        Self {
            audit_type: AuditType::InMemory,
            ..Default::default()
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            audit_type: AuditType::File,
            file_path: path.into(),
            ..Default::default()
        }
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self {
            audit_type: AuditType::Postgres,
            database_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_fallback_to_file(mut self, fallback: bool) -> Self {
        self.fallback_to_file = fallback;
        self
    }

    /// Resolves `Auto` to a concrete backend
    pub fn resolved_type(&self) -> AuditType {
        match self.audit_type {
            AuditType::Auto if self.database_url.is_some() => AuditType::Postgres,
            AuditType::Auto => AuditType::File,
            other => other,
        }
    }
}

/// Factory for creating audit log instances
#[derive(Debug, Default)]
pub struct AuditFactory;

impl AuditFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the configured audit log.
    ///
    /// An unreachable PostgreSQL falls back to the file log when
    /// `fallback_to_file` is set; a missing URL is always an error.
    pub async fn create(&self, config: &AuditConfig) -> Result<Arc<dyn AuditLog>, DomainError> {
        let resolved = config.resolved_type();
        info!(backend = %resolved, "Creating audit log");

        match resolved {
            AuditType::InMemory => Ok(Arc::new(InMemoryAuditLog::new())),
            AuditType::File | AuditType::Auto => self.create_file(config).await,
            AuditType::Postgres => {
                let url = config.database_url.clone().ok_or_else(|| {
                    DomainError::configuration("Database URL is required for postgres audit log")
                })?;

                let pg_config = PostgresAuditConfig::new(url)
                    .with_table(config.table.clone())
                    .with_connect_timeout(config.connect_timeout);

                match PostgresAuditLog::connect(&pg_config).await {
                    Ok(log) => Ok(Arc::new(log)),
                    Err(e @ DomainError::StoreUnavailable { .. }) if config.fallback_to_file => {
                        warn!(
                            error = %e,
                            path = %config.file_path.display(),
                            "PostgreSQL unreachable, using file audit log"
                        );
                        self.create_file(config).await
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Creates the JSONL file log at the configured path
    pub async fn create_file(
        &self,
        config: &AuditConfig,
    ) -> Result<Arc<dyn AuditLog>, DomainError> {
        let log = FileAuditLog::open(config.file_path.clone()).await?;
        Ok(Arc::new(log))
    }
}
