mod docs;
mod error;
mod state;
mod util;

pub mod routes;

pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/verify-email", post(routes::auth::verify_email))
        .route("/api/auth/verify/:token", get(routes::auth::verify_link))
        .route("/api/auth/me", get(routes::auth::me))
        .route("/api/departments", get(routes::departments::list_departments))
        .route(
            "/api/departments/pending-staff",
            get(routes::departments::pending_staff),
        )
        .route(
            "/api/staff/:identity_id/approve",
            post(routes::staff::approve_staff),
        )
        .route(
            "/api/staff/:identity_id/reject",
            post(routes::staff::reject_staff),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
