//! Identity repository for database operations.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use super::{status_column, timestamp_column};
use crate::entities::{Identity, NewIdentity, Role, VerificationStatus};
use crate::types::{DatabaseError, DatabaseResult};

const COLUMNS: &str = "id, public_id, email, username, password_hash, role, is_verified, verification_status, created_at, updated_at";

fn map_row(row: &SqliteRow) -> DatabaseResult<Identity> {
    let role: String = row.try_get("role")?;
    let role = role
        .parse::<Role>()
        .map_err(|err| DatabaseError::Corrupt(err.to_string()))?;

    Ok(Identity {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role,
        is_verified: row.try_get("is_verified")?,
        verification_status: status_column(row, "verification_status")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

/// Insert a new unverified identity. Email or username collisions surface as
/// [`DatabaseError::Duplicate`].
pub async fn insert<'e, E>(executor: E, request: &NewIdentity) -> DatabaseResult<Identity>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let public_id = cuid2::create_id();

    let result = sqlx::query(
        "INSERT INTO identities (public_id, email, username, password_hash, role, is_verified, verification_status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, 0, 'Pending', ?, ?)",
    )
    .bind(&public_id)
    .bind(&request.email)
    .bind(&request.username)
    .bind(&request.password_hash)
    .bind(request.role.as_str())
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(Identity {
        id: result.last_insert_rowid(),
        public_id,
        email: request.email.clone(),
        username: request.username.clone(),
        password_hash: request.password_hash.clone(),
        role: request.role,
        is_verified: false,
        verification_status: VerificationStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_by_id<'e, E>(executor: E, id: i64) -> DatabaseResult<Option<Identity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COLUMNS} FROM identities WHERE id = ?");
    let row = sqlx::query(&sql).bind(id).fetch_optional(executor).await?;
    row.as_ref().map(map_row).transpose()
}

pub async fn find_by_public_id<'e, E>(
    executor: E,
    public_id: &str,
) -> DatabaseResult<Option<Identity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COLUMNS} FROM identities WHERE public_id = ?");
    let row = sqlx::query(&sql).bind(public_id).fetch_optional(executor).await?;
    row.as_ref().map(map_row).transpose()
}

pub async fn find_by_email<'e, E>(executor: E, email: &str) -> DatabaseResult<Option<Identity>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {COLUMNS} FROM identities WHERE email = ?");
    let row = sqlx::query(&sql).bind(email).fetch_optional(executor).await?;
    row.as_ref().map(map_row).transpose()
}

/// True when either the email or the username is already registered.
pub async fn exists_by_email_or_username<'e, E>(
    executor: E,
    email: &str,
    username: &str,
) -> DatabaseResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM identities WHERE email = ? OR username = ? LIMIT 1")
            .bind(email)
            .bind(username)
            .fetch_optional(executor)
            .await?;
    Ok(found.is_some())
}

/// Flip a pending identity to verified. Returns `false` when the identity was
/// not pending, which includes losing a race to a concurrent verification.
pub async fn mark_verified<'e, E>(executor: E, id: i64) -> DatabaseResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE identities SET is_verified = 1, verification_status = 'Verified', updated_at = ?
         WHERE id = ? AND is_verified = 0 AND verification_status = 'Pending'",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Move a pending identity to rejected. Returns `false` if it was no longer pending.
pub async fn mark_rejected<'e, E>(executor: E, id: i64) -> DatabaseResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE identities SET verification_status = 'Rejected', updated_at = ?
         WHERE id = ? AND is_verified = 0 AND verification_status = 'Pending'",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn count_by_email<'e, E>(executor: E, email: &str) -> DatabaseResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM identities WHERE email = ?")
        .bind(email)
        .fetch_one(executor)
        .await?)
}
