//! Mapping of database errors into ledger errors.

use sea_orm::{DbErr, SqlErr};
use stockledger_core::LedgerError;
use tracing::{debug, error};

/// Postgres reports serialization failures (40001) and deadlocks (40P01)
/// with these messages.
const CONFLICT_MARKERS: [&str; 4] = [
    "could not serialize access",
    "deadlock detected",
    "40001",
    "40P01",
];

/// Converts a `DbErr` into `CommitConflict` when retrying could succeed,
/// otherwise into `Store`.
pub(crate) fn map_db_err(err: DbErr) -> LedgerError {
    if is_conflict(&err) {
        debug!(error = %err, "Database commit conflict");
        return LedgerError::CommitConflict;
    }
    error!(error = %err, "Database operation failed");
    LedgerError::Store(err.to_string())
}

fn is_conflict(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let message = err.to_string();
    CONFLICT_MARKERS.iter().any(|marker| message.contains(marker))
}
