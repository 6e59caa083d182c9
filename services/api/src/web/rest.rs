//! services/api/src/web/rest.rs
//!
//! Contains the service-level REST handlers and the master definition for the
//! OpenAPI specification.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::{auth, progress, user, voice};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::request_otp_handler,
        auth::verify_otp_handler,
        user::me_handler,
        user::update_preferences_handler,
        progress::get_progress_handler,
        progress::submit_lesson_handler,
        voice::evaluate_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::RequestOtpRequest,
            auth::VerifyOtpRequest,
            auth::AuthResponse,
            user::UpdatePreferencesRequest,
            user::PreferencesResponse,
            progress::SubmitLessonRequest,
            voice::EvaluateRequest,
            voice::EvaluateResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Signup, login and one-time-code authentication."),
        (name = "user", description = "The authenticated learner's profile."),
        (name = "progress", description = "Lesson progress tracking."),
        (name = "voice", description = "Spoken answer evaluation.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "The service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Backend is healthy".to_string(),
    })
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}
