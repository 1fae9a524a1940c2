use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use gatehouse_auth::{
    AuthError, DepartmentInput, LoginRequest, Principal, RegistrationRequest, VerificationProof,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{util::require_bearer, ApiError, AppState};

use super::departments::DepartmentResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    /// `User`, `Staff` or `Admin`, case-insensitive.
    pub user_type: String,
    pub department: Option<DepartmentPayload>,
}

/// `{name, description}` for an Admin, `{id}` for Staff.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DepartmentPayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(value: RegisterRequest) -> Self {
        Self {
            email: value.email,
            username: value.username,
            password: value.password,
            name: value.name,
            phone: value.phone,
            user_type: value.user_type,
            department: value.department.map(|d| DepartmentInput {
                id: d.id,
                name: d.name,
                description: d.description,
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_type: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct VerifyEmailRequest {
    /// Signed proof from the verification email.
    pub token: Option<String>,
    /// Bare email proof. Only accepted when `auth.allow_email_only_verification`
    /// is enabled; otherwise answered with 400.
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub user_type: String,
    pub is_verified: bool,
    pub verification_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentResponse>,
}

impl From<Principal> for MeResponse {
    fn from(value: Principal) -> Self {
        let Principal {
            identity,
            profile,
            department,
        } = value;
        let (name, phone) = match profile {
            Some(profile) => (Some(profile.name), profile.phone),
            None => (None, None),
        };
        Self {
            id: identity.public_id,
            email: identity.email,
            username: identity.username,
            user_type: identity.role.to_string(),
            is_verified: identity.is_verified,
            verification_status: identity.verification_status.to_string(),
            name,
            phone,
            department: department.map(DepartmentResponse::from),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered; verification email sent or approval pending", body = MessageResponse),
        (status = 400, description = "Invalid role, duplicate identity, missing department or invalid input", body = crate::error::ErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(body) = payload?;
    let outcome = state
        .authenticator()
        .register(body.into())
        .await
        .map_err(|error| {
            ApiError::from(error).with_internal_message("Error registering user")
        })?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new(outcome.message()))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 400, description = "Unknown user or invalid credentials", body = crate::error::ErrorResponse),
        (status = 403, description = "Email unverified, approval pending or registration rejected", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = payload?;
    let outcome = state
        .authenticator()
        .login(LoginRequest {
            email: body.email,
            password: body.password,
        })
        .await
        .map_err(|error| match error {
            AuthError::IdentityNotFound => ApiError::bad_request(error.to_string()),
            other => ApiError::from(other).with_internal_message("Error logging in"),
        })?;

    Ok(Json(LoginResponse {
        message: outcome.message().to_string(),
        user_type: outcome.role().to_string(),
        token: outcome.token,
    }))
}

async fn verify(
    state: &AppState,
    proof: VerificationProof,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .authenticator()
        .verify_email(proof)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    tag = "Auth",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Already verified or invalid proof", body = crate::error::ErrorResponse),
        (status = 403, description = "Staff are verified by approval", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
/// Verify an email address.
///
/// Send `{ "token": ... }` with the proof from the verification email. The
/// `{ "email": ... }` form is only honoured when the server runs with
/// `auth.allow_email_only_verification = true`; with the default
/// configuration it is rejected as an invalid proof.
pub async fn verify_email(
    State(state): State<AppState>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = payload?;
    let proof = match (body.token, body.email) {
        (Some(token), _) if !token.trim().is_empty() => {
            VerificationProof::Token(token.trim().to_string())
        }
        (_, Some(email)) if !email.trim().is_empty() => VerificationProof::Email(email),
        _ => return Err(ApiError::bad_request("Verification token is required")),
    };
    verify(&state, proof).await
}

#[utoipa::path(
    get,
    path = "/api/auth/verify/{token}",
    tag = "Auth",
    params(("token" = String, Path, description = "Verification token from the email link")),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Already verified or invalid proof", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    verify(&state, VerificationProof::Token(token)).await
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let principal = state
        .authenticator()
        .current_principal(&token)
        .await
        .map_err(ApiError::from_bearer)?;
    Ok(Json(principal.into()))
}
