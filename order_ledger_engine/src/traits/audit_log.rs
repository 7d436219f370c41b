use thiserror::Error;

use crate::db_types::{HistoryRecord, NewHistoryRecord};

#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AuditLogError {
    fn from(e: sqlx::Error) -> Self {
        AuditLogError::DatabaseError(e.to_string())
    }
}

/// An append-only record of significant mutations.
///
/// Implementations must persist the record before returning, and must not share a connection or transaction with the
/// operation being audited.
#[allow(async_fn_in_trait)]
pub trait AuditLog {
    async fn record(&self, record: NewHistoryRecord) -> Result<HistoryRecord, AuditLogError>;

    /// All history for a subject, oldest first. The engine itself never reads history back.
    async fn fetch_history(&self, object_table: &str, object_id: &str) -> Result<Vec<HistoryRecord>, AuditLogError>;
}
