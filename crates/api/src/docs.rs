use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::verify_email,
        crate::routes::auth::verify_link,
        crate::routes::auth::me,
        crate::routes::departments::list_departments,
        crate::routes::departments::pending_staff,
        crate::routes::staff::approve_staff,
        crate::routes::staff::reject_staff
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::MessageResponse,
            crate::routes::auth::RegisterRequest,
            crate::routes::auth::DepartmentPayload,
            crate::routes::auth::LoginPayload,
            crate::routes::auth::LoginResponse,
            crate::routes::auth::VerifyEmailRequest,
            crate::routes::auth::MeResponse,
            crate::routes::departments::DepartmentResponse,
            crate::routes::departments::PendingStaffResponse,
            crate::routes::staff::StaffDecisionResponse
        )
    ),
    tags(
        (name = "Health", description = "Service liveness"),
        (name = "Auth", description = "Registration, email verification and login"),
        (name = "Departments", description = "Department directory and staff queue"),
        (name = "Staff", description = "Administrator decisions on staff registrations")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        components
            .security_schemes
            .insert("bearerAuth".to_string(), scheme);
    }
}
