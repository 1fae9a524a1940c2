use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use gatehouse_auth::StaffDecision;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{util::require_bearer, ApiError, AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffDecisionResponse {
    pub message: String,
    pub id: String,
    pub verification_status: String,
}

async fn decide(
    state: &AppState,
    headers: &HeaderMap,
    identity_id: &str,
    decision: StaffDecision,
) -> Result<Json<StaffDecisionResponse>, ApiError> {
    let token = require_bearer(headers)?;
    let staff = state
        .authenticator()
        .decide_staff(&token, identity_id, decision)
        .await
        .map_err(ApiError::from_bearer)?;

    let message = match decision {
        StaffDecision::Approve => "Staff approved",
        StaffDecision::Reject => "Staff rejected",
    };
    Ok(Json(StaffDecisionResponse {
        message: message.to_string(),
        id: staff.public_id,
        verification_status: staff.verification_status.to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/staff/{identity_id}/approve",
    tag = "Staff",
    security(("bearerAuth" = [])),
    params(("identity_id" = String, Path, description = "Public id of the staff identity")),
    responses(
        (status = 200, description = "Staff approved", body = StaffDecisionResponse),
        (status = 400, description = "Already decided or not a staff identity", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller does not administer the staff's department", body = crate::error::ErrorResponse),
        (status = 404, description = "Staff not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_staff(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StaffDecisionResponse>, ApiError> {
    decide(&state, &headers, &identity_id, StaffDecision::Approve).await
}

#[utoipa::path(
    post,
    path = "/api/staff/{identity_id}/reject",
    tag = "Staff",
    security(("bearerAuth" = [])),
    params(("identity_id" = String, Path, description = "Public id of the staff identity")),
    responses(
        (status = 200, description = "Staff rejected", body = StaffDecisionResponse),
        (status = 400, description = "Already decided or not a staff identity", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller does not administer the staff's department", body = crate::error::ErrorResponse),
        (status = 404, description = "Staff not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_staff(
    State(state): State<AppState>,
    Path(identity_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StaffDecisionResponse>, ApiError> {
    decide(&state, &headers, &identity_id, StaffDecision::Reject).await
}
