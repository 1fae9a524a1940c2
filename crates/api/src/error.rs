use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse_auth::{AuthError, ErrorKind};
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

const INTERNAL_ERROR: &str = "internal server error";

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    /// Present on 500 responses only; never carries internals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Replace the message of a 500 with an operation-specific one.
    pub fn with_internal_message(mut self, message: &str) -> Self {
        if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            self.message = message.to_string();
        }
        self
    }

    /// Mapping for routes guarded by a bearer session token: a bad token is 401.
    pub fn from_bearer(error: AuthError) -> Self {
        match error {
            AuthError::InvalidOrExpiredProof => Self::unauthorized("Invalid or expired session"),
            other => other.into(),
        }
    }

    pub fn status_for(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::Authentication => {
                StatusCode::BAD_REQUEST
            }
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::Integrity | ErrorKind::Transient => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error = (self.status == StatusCode::INTERNAL_SERVER_ERROR)
            .then(|| INTERNAL_ERROR.to_string());
        let body = Json(ErrorResponse {
            message: self.message,
            error,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        let status = Self::status_for(error.kind());
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = ?error, "auth error");
            return Self::internal_server_error("Internal server error");
        }
        debug!(error = %error, %status, "auth request refused");
        Self::new(status, error.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "rejected request body");
        Self::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_database::DatabaseError;

    #[test]
    fn auth_errors_map_to_expected_statuses() {
        let cases = [
            (AuthError::InvalidRole("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::DuplicateIdentity, StatusCode::BAD_REQUEST),
            (AuthError::MissingDepartment, StatusCode::BAD_REQUEST),
            (AuthError::AlreadyVerified, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (AuthError::IdentityNotFound, StatusCode::NOT_FOUND),
            (AuthError::PendingVerification, StatusCode::FORBIDDEN),
            (AuthError::PendingApproval, StatusCode::FORBIDDEN),
            (AuthError::Rejected, StatusCode::FORBIDDEN),
            (
                AuthError::OrphanedAdminDepartment("a".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let error = ApiError::from(AuthError::Database(DatabaseError::Corrupt(
            "secret detail".into(),
        )));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!error.message.contains("secret detail"));

        let renamed = error.with_internal_message("Error registering user");
        assert_eq!(renamed.message, "Error registering user");
    }

    #[test]
    fn bearer_routes_report_bad_tokens_as_unauthorized() {
        let error = ApiError::from_bearer(AuthError::InvalidOrExpiredProof);
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
        let error = ApiError::from_bearer(AuthError::Forbidden);
        assert_eq!(error.status, StatusCode::FORBIDDEN);
    }
}
