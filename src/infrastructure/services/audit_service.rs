//! Prediction audit service

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::audit::{AuditLog, AuditRecord};
use crate::domain::DomainError;

/// Appends audit records to the primary log, optionally mirroring failures.
///
/// When the primary append fails and a mirror is configured, the record is
/// written to the mirror so it is not lost; the primary error is still
/// returned so the caller can count it.
#[derive(Clone)]
pub struct AuditService {
    primary: Arc<dyn AuditLog>,
    mirror: Option<Arc<dyn AuditLog>>,
}

impl std::fmt::Debug for AuditService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditService")
            .field("primary", &self.primary.backend())
            .field("mirror", &self.mirror.as_ref().map(|m| m.backend()))
            .finish()
    }
}

impl AuditService {
    pub fn new(primary: Arc<dyn AuditLog>) -> Self {
        Self {
            primary,
            mirror: None,
        }
    }

    /// Adds a fallback log receiving records the primary rejected
    pub fn with_mirror(mut self, mirror: Arc<dyn AuditLog>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn backend(&self) -> &'static str {
        self.primary.backend()
    }

    pub async fn record(&self, record: &AuditRecord) -> Result<(), DomainError> {
        match self.primary.append(record).await {
            Ok(()) => {
                debug!(record_id = %record.id, backend = self.primary.backend(), "Audit record appended");
                Ok(())
            }
            Err(e) => {
                if let Some(mirror) = &self.mirror {
                    match mirror.append(record).await {
                        Ok(()) => debug!(
                            record_id = %record.id,
                            backend = mirror.backend(),
                            "Audit record mirrored after primary failure"
                        ),
                        Err(mirror_err) => warn!(
                            record_id = %record.id,
                            error = %mirror_err,
                            "Audit mirror append failed"
                        ),
                    }
                }
                Err(e)
            }
        }
    }

    /// Most recent records from the primary log, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<AuditRecord>, DomainError> {
        self.primary.recent(limit).await
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.primary.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::MockAuditLog;
    use crate::domain::cache::RequestHasher;
    use crate::domain::trip::TripRequest;
    use crate::infrastructure::audit::InMemoryAuditLog;
    use chrono::Utc;

    fn record() -> AuditRecord {
        let request = TripRequest::builder()
            .pickup(40.75, -73.99)
            .dropoff(40.74, -73.98)
            .passenger_count(1)
            .trip_distance(1.2)
            .build()
            .unwrap();
        let key = RequestHasher::new().hash(&request);
        AuditRecord::new(request, 3.0, false, key, "v1", Utc::now())
    }

    fn failing_log() -> MockAuditLog {
        let mut mock = MockAuditLog::new();
        mock.expect_backend().return_const("mock");
        mock.expect_append()
            .returning(|_| Err(DomainError::store_unavailable("mock", "table missing")));
        mock
    }

    #[tokio::test]
    async fn test_record_appends_to_primary() {
        let log = Arc::new(InMemoryAuditLog::new());
        let service = AuditService::new(log.clone());

        service.record(&record()).await.unwrap();

        assert_eq!(log.len().await, 1);
        assert_eq!(service.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_append_is_mirrored() {
        let mirror = Arc::new(InMemoryAuditLog::new());
        let service = AuditService::new(Arc::new(failing_log())).with_mirror(mirror.clone());

        let result = service.record(&record()).await;

        assert!(matches!(result, Err(DomainError::StoreUnavailable { .. })));
        assert_eq!(mirror.len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_append_without_mirror() {
        let service = AuditService::new(Arc::new(failing_log()));

        tokio_test::assert_err!(service.record(&record()).await);
    }
}
