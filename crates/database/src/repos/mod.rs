//! Database repository implementations
//!
//! Every function takes any SQLite executor, so the same calls run against
//! the pool or inside a transaction (`&mut *tx`).

pub mod department_repository;
pub mod identity_repository;
pub mod profile_repository;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::entities::VerificationStatus;
use crate::types::{DatabaseError, DatabaseResult};

pub(crate) fn status_column(row: &SqliteRow, column: &str) -> DatabaseResult<VerificationStatus> {
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(DatabaseError::Corrupt)
}

pub(crate) fn timestamp_column(row: &SqliteRow, column: &str) -> DatabaseResult<DateTime<Utc>> {
    Ok(row.try_get(column)?)
}
