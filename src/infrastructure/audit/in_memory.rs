//! In-memory audit log

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::audit::{AuditLog, AuditRecord};
use crate::domain::DomainError;

/// Process-local audit log.
///
/// Useful for tests and single-node development. Records are lost when the
/// process terminates.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    records: RwLock<Vec<AuditRecord>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    fn backend(&self) -> &'static str {
        "in_memory"
    }

    async fn append(&self, record: &AuditRecord) -> Result<(), DomainError> {
        let mut records = self.records.write().await;

        // Redelivery of the same record is a no-op
        if records.iter().any(|existing| existing.id == record.id) {
            return Ok(());
        }

        records.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::RequestHasher;
    use crate::domain::trip::TripRequest;
    use chrono::Utc;

    fn record(prediction: f64) -> AuditRecord {
        let request = TripRequest::builder()
            .pickup(40.75, -73.99)
            .dropoff(40.74, -73.98)
            .passenger_count(1)
            .trip_distance(1.2)
            .build()
            .unwrap();
        let key = RequestHasher::new().hash(&request);

        AuditRecord::new(request, prediction, false, key, "v1", Utc::now())
    }

    #[tokio::test]
    async fn test_append_and_recent_newest_first() {
        let log = InMemoryAuditLog::new();

        log.append(&record(1.0)).await.unwrap();
        log.append(&record(2.0)).await.unwrap();
        log.append(&record(3.0)).await.unwrap();

        let recent = log.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].prediction, 3.0);
        assert_eq!(recent[1].prediction, 2.0);
    }

    #[tokio::test]
    async fn test_duplicate_append_is_idempotent() {
        let log = InMemoryAuditLog::new();
        let rec = record(1.0);

        log.append(&rec).await.unwrap();
        log.append(&rec).await.unwrap();

        assert_eq!(log.len().await, 1);
    }

    #[tokio::test]
    async fn test_empty_log() {
        let log = InMemoryAuditLog::new();

        assert!(log.is_empty().await);
        assert!(log.recent(10).await.unwrap().is_empty());
    }
}
