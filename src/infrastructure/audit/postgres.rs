//! PostgreSQL audit log with connection pooling

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::domain::audit::{AuditLog, AuditRecord};
use crate::domain::DomainError;

const BACKEND: &str = "postgres";

/// PostgreSQL audit log configuration
#[derive(Debug, Clone)]
pub struct PostgresAuditConfig {
    /// Database connection URL
    pub url: String,
    /// Table holding the records
    pub table: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Pool acquire timeout
    pub connect_timeout: Duration,
}

impl Default for PostgresAuditConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/trip_predictions".to_string(),
            table: "prediction_logs".to_string(),
            max_connections: 10,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl PostgresAuditConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Stores audit records in a table keyed by record id.
///
/// Each row keeps the filterable columns alongside the full record as JSONB.
/// Re-inserting an id is ignored, so at-least-once delivery never duplicates.
pub struct PostgresAuditLog {
    pool: PgPool,
    table: String,
}

impl Debug for PostgresAuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAuditLog")
            .field("table", &self.table)
            .finish()
    }
}

fn storage_error(action: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::store_unavailable(BACKEND, format!("Failed to {}: {}", action, e))
}

impl PostgresAuditLog {
    /// Creates a log over an existing pool
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self, DomainError> {
        let table = table.into();

        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(DomainError::configuration(format!(
                "Invalid audit table name '{}'",
                table
            )));
        }

        Ok(Self { pool, table })
    }

    /// Connects a new pool and ensures the table exists
    pub async fn connect(config: &PostgresAuditConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect(&config.url)
            .await
            .map_err(|e| storage_error("connect to PostgreSQL", e))?;

        let log = Self::new(pool, config.table.clone())?;
        log.ensure_table().await?;
        Ok(log)
    }

    /// Creates the audit table and its time index if missing
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let create = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id VARCHAR(64) PRIMARY KEY,
                served_at TIMESTAMPTZ NOT NULL,
                cache_hit BOOLEAN NOT NULL,
                prediction DOUBLE PRECISION NOT NULL,
                model_version VARCHAR(255) NOT NULL,
                cache_key VARCHAR(64) NOT NULL,
                user_id VARCHAR(255) NOT NULL,
                record JSONB NOT NULL
            )
            "#,
            table = self.table
        );

        sqlx::query(&create)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("create audit table", e))?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS {table}_served_at_idx ON {table} (served_at DESC)",
            table = self.table
        );

        sqlx::query(&index)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("create audit index", e))?;

        Ok(())
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError> {
        let data = serde_json::to_value(record).map_err(|e| {
            DomainError::internal(format!("Failed to serialize audit record: {}", e))
        })?;

        let query = format!(
            r#"
            INSERT INTO {} (id, served_at, cache_hit, prediction, model_version, cache_key, user_id, record)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
            self.table
        );

        sqlx::query(&query)
            .bind(record.id.as_str())
            .bind(record.served_at)
            .bind(record.cache_hit)
            .bind(record.prediction)
            .bind(&record.model_version)
            .bind(record.cache_key.as_str())
            .bind(record.user_id())
            .bind(&data)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("insert audit record", e))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError> {
        let query = format!(
            "SELECT record FROM {} ORDER BY served_at DESC LIMIT $1",
            self.table
        );

        let rows = sqlx::query(&query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("list audit records", e))?;

        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let data: serde_json::Value = row.get("record");
            let record: AuditRecord = serde_json::from_value(data)
                .map_err(|e| storage_error("deserialize audit record", e))?;
            records.push(record);
        }

        Ok(records)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("ping PostgreSQL", e))?;

        Ok(())
    }
}
