//! Profile repository for database operations.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use super::{status_column, timestamp_column};
use crate::entities::{NewProfile, Profile, StaffMember, VerificationStatus};
use crate::types::DatabaseResult;

fn map_row(row: &SqliteRow) -> DatabaseResult<Profile> {
    Ok(Profile {
        identity_id: row.try_get("identity_id")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        department_id: row.try_get("department_id")?,
        approved_by: row.try_get("approved_by")?,
        created_at: timestamp_column(row, "created_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

pub async fn insert<'e, E>(executor: E, request: &NewProfile) -> DatabaseResult<Profile>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO profiles (identity_id, name, phone, department_id, approved_by, created_at, updated_at)
         VALUES (?, ?, ?, ?, NULL, ?, ?)",
    )
    .bind(request.identity_id)
    .bind(&request.name)
    .bind(&request.phone)
    .bind(request.department_id)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(Profile {
        identity_id: request.identity_id,
        name: request.name.clone(),
        phone: request.phone.clone(),
        department_id: request.department_id,
        approved_by: None,
        created_at: now,
        updated_at: now,
    })
}

pub async fn find_by_identity<'e, E>(
    executor: E,
    identity_id: i64,
) -> DatabaseResult<Option<Profile>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        "SELECT identity_id, name, phone, department_id, approved_by, created_at, updated_at
         FROM profiles WHERE identity_id = ?",
    )
    .bind(identity_id)
    .fetch_optional(executor)
    .await?;
    row.as_ref().map(map_row).transpose()
}

/// Record which Admin approved a Staff profile.
pub async fn set_approved_by<'e, E>(
    executor: E,
    identity_id: i64,
    admin_id: i64,
) -> DatabaseResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE profiles SET approved_by = ?, updated_at = ? WHERE identity_id = ? AND approved_by IS NULL",
    )
    .bind(admin_id)
    .bind(Utc::now())
    .bind(identity_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Staff members of a department in the given status, oldest first.
pub async fn list_staff_by_department<'e, E>(
    executor: E,
    department_id: i64,
    status: VerificationStatus,
) -> DatabaseResult<Vec<StaffMember>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query(
        "SELECT i.public_id, i.email, i.username, i.verification_status, i.created_at, p.name, p.phone
         FROM profiles p
         JOIN identities i ON i.id = p.identity_id
         WHERE p.department_id = ? AND i.role = 'Staff' AND i.verification_status = ?
         ORDER BY i.created_at, i.id",
    )
    .bind(department_id)
    .bind(status.as_str())
    .fetch_all(executor)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(StaffMember {
                public_id: row.try_get("public_id")?,
                email: row.try_get("email")?,
                username: row.try_get("username")?,
                name: row.try_get("name")?,
                phone: row.try_get("phone")?,
                verification_status: status_column(row, "verification_status")?,
                registered_at: timestamp_column(row, "created_at")?,
            })
        })
        .collect()
}

pub async fn count_for_identity<'e, E>(executor: E, identity_id: i64) -> DatabaseResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE identity_id = ?")
        .bind(identity_id)
        .fetch_one(executor)
        .await?)
}
