//! Audit infrastructure - Audit log implementations

mod factory;
mod file;
mod in_memory;
mod postgres;

pub use factory::{AuditConfig, AuditFactory, AuditType};
pub use file::FileAuditLog;
pub use in_memory::InMemoryAuditLog;
pub use postgres::{PostgresAuditConfig, PostgresAuditLog};
