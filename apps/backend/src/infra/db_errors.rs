//! `DbError` -> `DomainError` translation.
//!
//! Repositories return `db_pool::DbError`; this is the single place that turns
//! SQLite failures into domain terms. Raw messages are logged redacted and
//! never echoed back to clients.

use db_pool::{DbError, PoolError};
use tracing::{error, warn};

use crate::errors::domain::{
    ConflictKind, DomainError, InfraErrorKind, NotFoundKind, ValidationKind,
};
use crate::logging::pii::Redacted;
use crate::trace_ctx;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

/// Columns named by SQLite's "UNIQUE constraint failed: t.a, t.b" message.
fn unique_columns(message: &str) -> Option<&str> {
    message
        .find(UNIQUE_PREFIX)
        .map(|pos| message[pos + UNIQUE_PREFIX.len()..].trim())
}

fn map_unique_columns(columns: &str) -> Option<(ConflictKind, &'static str)> {
    match columns {
        "users.email" => Some((ConflictKind::UniqueEmail, "Email already registered")),
        "users.sub" => Some((
            ConflictKind::SubMismatch,
            "Subject already linked to another user",
        )),
        "habit_logs.habit_id, habit_logs.completed_on" => Some((
            ConflictKind::LogAlreadyExists,
            "Habit already logged for this date",
        )),
        _ => None,
    }
}

fn map_pool_err(e: &PoolError) -> DomainError {
    match e {
        PoolError::Exhausted { .. } | PoolError::Init { .. } | PoolError::Connection { .. } => {
            DomainError::infra(InfraErrorKind::DbUnavailable, "Database unavailable")
        }
        PoolError::Config { .. } | PoolError::Shutdown { .. } => DomainError::infra(
            InfraErrorKind::Other("Pool".into()),
            "Database operation failed",
        ),
    }
}

/// Translate a `DbError` into a `DomainError` with sanitized detail.
pub fn map_db_err(e: DbError) -> DomainError {
    let trace_id = trace_ctx::trace_id();

    match e.root() {
        DbError::Pool(pool_err) => {
            warn!(trace_id = %trace_id, error = %pool_err, "Database pool failure");
            map_pool_err(pool_err)
        }
        DbError::Query(sqlx::Error::RowNotFound) => DomainError::not_found(
            NotFoundKind::Other("Record".into()),
            "Record not found",
        ),
        DbError::Query(sqlx::Error::Database(db_err)) => {
            let message = db_err.message();
            if db_err.is_unique_violation() {
                warn!(trace_id = %trace_id, raw_error = %Redacted(message), "Unique constraint violation");
                if let Some((kind, detail)) = unique_columns(message).and_then(map_unique_columns) {
                    return DomainError::conflict(kind, detail);
                }
                return DomainError::conflict(
                    ConflictKind::Other("Unique".into()),
                    "Unique constraint violation",
                );
            }
            if db_err.is_foreign_key_violation() {
                warn!(trace_id = %trace_id, raw_error = %Redacted(message), "Foreign key constraint violation");
                return DomainError::validation(
                    ValidationKind::Other("FK_VIOLATION".into()),
                    "Foreign key constraint violation",
                );
            }
            if db_err.is_check_violation() {
                warn!(trace_id = %trace_id, raw_error = %Redacted(message), "Check constraint violation");
                return DomainError::validation(
                    ValidationKind::Other("CHECK_VIOLATION".into()),
                    "Check constraint violation",
                );
            }
            error!(trace_id = %trace_id, raw_error = %Redacted(message), "Unhandled database error");
            DomainError::infra(
                InfraErrorKind::Other("Sqlite".into()),
                "Database operation failed",
            )
        }
        DbError::Query(sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_)) => {
            error!(trace_id = %trace_id, error = %e, "Undecodable row");
            DomainError::infra(InfraErrorKind::DataCorruption, "Stored data is unreadable")
        }
        other => {
            error!(trace_id = %trace_id, raw_error = %Redacted(&other.to_string()), "Unhandled database error");
            DomainError::infra(
                InfraErrorKind::Other("Sqlite".into()),
                "Database operation failed",
            )
        }
    }
}
