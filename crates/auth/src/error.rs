use gatehouse_database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid user type")]
    InvalidRole(String),
    #[error("User already exists")]
    DuplicateIdentity,
    #[error("Department details are required for this user type")]
    MissingDepartment,
    #[error("{0}")]
    Validation(String),
    #[error("User not found")]
    IdentityNotFound,
    #[error("User already verified")]
    AlreadyVerified,
    #[error("Registration has already been decided")]
    AlreadyDecided,
    #[error("Invalid or expired token")]
    InvalidOrExpiredProof,
    #[error("Account is awaiting administrator approval")]
    PendingApproval,
    #[error("User not verified. Please verify your email.")]
    PendingVerification,
    #[error("Registration was rejected by an administrator")]
    Rejected,
    #[error("Not allowed to perform this action")]
    Forbidden,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("admin {0} owns no department")]
    OrphanedAdminDepartment(String),
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("token expiry out of range")]
    TokenLifetime,
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        AuthError::Database(DatabaseError::from(error))
    }
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Authorization,
    Authentication,
    Integrity,
    Transient,
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidRole(_)
            | AuthError::MissingDepartment
            | AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::DuplicateIdentity
            | AuthError::AlreadyVerified
            | AuthError::AlreadyDecided => ErrorKind::Conflict,
            AuthError::IdentityNotFound => ErrorKind::NotFound,
            AuthError::PendingVerification
            | AuthError::PendingApproval
            | AuthError::Rejected
            | AuthError::Forbidden => ErrorKind::Authorization,
            AuthError::InvalidCredentials | AuthError::InvalidOrExpiredProof => {
                ErrorKind::Authentication
            }
            AuthError::OrphanedAdminDepartment(_) => ErrorKind::Integrity,
            AuthError::Database(_)
            | AuthError::PasswordHash(_)
            | AuthError::Token(_)
            | AuthError::TokenLifetime => ErrorKind::Transient,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AuthError::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_the_taxonomy() {
        assert_eq!(AuthError::InvalidRole("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(AuthError::DuplicateIdentity.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::AlreadyDecided.kind(), ErrorKind::Conflict);
        assert_eq!(AuthError::IdentityNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(AuthError::Rejected.kind(), ErrorKind::Authorization);
        assert_eq!(AuthError::InvalidOrExpiredProof.kind(), ErrorKind::Authentication);
        assert_eq!(
            AuthError::OrphanedAdminDepartment("admin".into()).kind(),
            ErrorKind::Integrity
        );
        assert_eq!(
            AuthError::Database(DatabaseError::Corrupt("bad".into())).kind(),
            ErrorKind::Transient
        );
        assert_eq!(AuthError::TokenLifetime.kind(), ErrorKind::Transient);
    }

    #[test]
    fn sqlx_errors_become_database_errors() {
        let error = AuthError::from(sqlx::Error::RowNotFound);
        assert!(matches!(error, AuthError::Database(DatabaseError::QueryError(_))));
    }
}
