//! Department repository for database operations.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use super::{status_column, timestamp_column};
use crate::entities::{Department, NewDepartment, VerificationStatus};
use crate::types::DatabaseResult;

const COLUMNS: &str =
    "id, public_id, name, description, admin_identity_id, verification_status, created_at, updated_at";

fn map_row(row: &SqliteRow) -> DatabaseResult<Department> {
    Ok(Department {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        admin_identity_id: row.try_get("admin_identity_id")?,
        verification_status: status_column(row, "verification_status")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

pub async fn insert<'e, E>(executor: E, request: &NewDepartment) -> DatabaseResult<Department>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let public_id = cuid2::create_id();

    let result = sqlx::query(
        "INSERT INTO departments (public_id, name, description, admin_identity_id, verification_status, created_at, updated_at)
         VALUES (?, ?, ?, ?, 'Pending', ?, ?)",
    )
    .bind(&public_id)
    .bind(&request.name)
    .bind(&request.description)
    .bind(request.admin_identity_id)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(Department {
        id: result.last_insert_rowid(),
        public_id,
        name: request.name.clone(),
        description: request.description.clone(),
        admin_identity_id: request.admin_identity_id,
        verification_status: VerificationStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> DatabaseResult<Option<Department>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COLUMNS} FROM departments WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    row.as_ref().map(map_row).transpose()
}

pub async fn find_by_public_id<'e, E>(
    executor: E,
    public_id: &str,
) -> DatabaseResult<Option<Department>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COLUMNS} FROM departments WHERE public_id = ?");
    let row = sqlx::query(&sql).bind(public_id).fetch_optional(executor).await?;
    row.as_ref().map(map_row).transpose()
}

pub async fn find_by_admin<'e, E>(
    executor: E,
    admin_identity_id: i64,
) -> DatabaseResult<Option<Department>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COLUMNS} FROM departments WHERE admin_identity_id = ?");
    let row = sqlx::query(&sql)
        .bind(admin_identity_id)
        .fetch_optional(executor)
        .await?;
    row.as_ref().map(map_row).transpose()
}

/// Mark the department owned by `admin_identity_id` as verified.
///
/// Idempotent: an already verified department still counts as matched, so the
/// return value is the number of departments owned by the admin (0 or 1).
pub async fn mark_verified_for_admin<'e, E>(
    executor: E,
    admin_identity_id: i64,
) -> DatabaseResult<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE departments
         SET verification_status = 'Verified',
             updated_at = CASE WHEN verification_status = 'Verified' THEN updated_at ELSE ? END
         WHERE admin_identity_id = ?",
    )
    .bind(Utc::now())
    .bind(admin_identity_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_by_status<'e, E>(
    executor: E,
    status: VerificationStatus,
) -> DatabaseResult<Vec<Department>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM departments WHERE verification_status = ? ORDER BY name, id"
    );
    let rows = sqlx::query(&sql).bind(status.as_str()).fetch_all(executor).await?;
    rows.iter().map(map_row).collect()
}

pub async fn count<'e, E>(executor: E) -> DatabaseResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM departments")
        .fetch_one(executor)
        .await?)
}
