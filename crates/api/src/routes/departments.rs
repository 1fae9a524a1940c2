use axum::{extract::State, http::HeaderMap, Json};
use gatehouse_database::{Department, StaffMember};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{util::require_bearer, ApiError, AppState};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub verification_status: String,
}

impl From<Department> for DepartmentResponse {
    fn from(value: Department) -> Self {
        Self {
            id: value.public_id,
            name: value.name,
            description: value.description,
            verification_status: value.verification_status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingStaffResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub registered_at: String,
}

impl From<StaffMember> for PendingStaffResponse {
    fn from(value: StaffMember) -> Self {
        Self {
            id: value.public_id,
            email: value.email,
            username: value.username,
            name: value.name,
            phone: value.phone,
            registered_at: value.registered_at.to_rfc3339(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/departments",
    tag = "Departments",
    responses((status = 200, description = "Verified departments", body = [DepartmentResponse]))
)]
pub async fn list_departments(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentResponse>>, ApiError> {
    let departments = state
        .authenticator()
        .verified_departments()
        .await
        .map_err(ApiError::from)?;
    Ok(Json(departments.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/departments/pending-staff",
    tag = "Departments",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Staff awaiting approval in the caller's department", body = [PendingStaffResponse]),
        (status = 401, description = "Missing or invalid session", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a verified admin", body = crate::error::ErrorResponse)
    )
)]
pub async fn pending_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PendingStaffResponse>>, ApiError> {
    let token = require_bearer(&headers)?;
    let staff = state
        .authenticator()
        .pending_staff(&token)
        .await
        .map_err(ApiError::from_bearer)?;
    Ok(Json(staff.into_iter().map(Into::into).collect()))
}
