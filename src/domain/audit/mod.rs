//! Audit domain - Append-only record of served predictions

mod record;
mod repository;

pub use record::{AuditRecord, AuditRecordId};
pub use repository::AuditLog;

#[cfg(test)]
pub use repository::MockAuditLog;
