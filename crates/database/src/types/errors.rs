//! Error types for the database layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    /// A UNIQUE constraint rejected the write. Carries the constraint message.
    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// A stored value could not be mapped back onto its entity.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Database query error: {0}")]
    QueryError(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                return DatabaseError::Duplicate(db_error.message().to_string());
            }
        }
        DatabaseError::QueryError(error)
    }
}

impl DatabaseError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate(_))
    }
}
