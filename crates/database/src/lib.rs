//! Gatehouse Database Crate
//!
//! Connection management, migrations, entities and repositories for the
//! identity store.

use gatehouse_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use entities::{
    Department, Identity, NewDepartment, NewIdentity, NewProfile, Profile, Role, StaffMember,
    UnknownRole, VerificationStatus,
};
pub use repos::{department_repository, identity_repository, profile_repository};
pub use types::{DatabaseError, DatabaseResult};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn initialize_database_applies_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", temp_dir.path().join("init.db").display()),
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM identities")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn initialize_database_reports_connection_failures() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-directory");
        std::fs::write(&blocker, b"").unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", blocker.join("gatehouse.db").display()),
            max_connections: 1,
        };
        let err = initialize_database(&config).await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
    }
}
