//! Audit log trait

use async_trait::async_trait;

use super::AuditRecord;
use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// Append-only log of served predictions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Backend name used in logs and health checks
    fn backend(&self) -> &'static str;

    /// Appends a record; at-least-once delivery is acceptable
    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError>;

    /// Returns up to `limit` records, newest first
    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError>;

    /// Verifies the log is writable
    async fn ping(&self) -> Result<(), DomainError>;
}
