//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: email/password signup and login, and mobile
//! one-time-code request and verification.

use axum::{extract::State, response::IntoResponse, Json};
use learning_core::Authenticated;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, LazyLock};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::web::{extract::ValidatedJson, state::AppState};

/// Ten-digit mobile number, no country prefix.
static MOBILE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10}$").expect("mobile regex is valid"));

fn validate_mobile(mobile: &str) -> Result<(), ValidationError> {
    if MOBILE_REGEX.is_match(mobile) {
        Ok(())
    } else {
        let mut err = ValidationError::new("invalid_mobile");
        err.message = Some("Mobile number must be 10 digits".into());
        Err(err)
    }
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RequestOtpRequest {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct VerifyOtpRequest {
    #[validate(custom(function = "validate_mobile"))]
    pub mobile: String,
    #[validate(length(equal = 6, message = "OTP must be exactly 6 characters"))]
    pub otp: String,
}

/// Returned by every endpoint that authenticates a learner.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    /// The public user record. Never carries the password hash.
    #[schema(value_type = Object)]
    pub user: learning_core::PublicUser,
}

impl From<Authenticated> for AuthResponse {
    fn from(auth: Authenticated) -> Self {
        Self {
            success: true,
            token: auth.token,
            user: auth.user,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Create a new account with an email and password.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already in use"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let auth = state
        .identity
        .signup(&req.email, &req.password, req.name.as_deref())
        .await?;
    Ok(Json(AuthResponse::from(auth)))
}

/// Log in with an email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let auth = state.identity.login(&req.email, &req.password).await?;
    Ok(Json(auth.into()))
}

/// Issue a one-time code for a mobile number.
///
/// Delivery of the code is out of scope for this service.
#[utoipa::path(
    post,
    path = "/api/auth/request-otp",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Code issued"),
        (status = 400, description = "Invalid mobile number"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn request_otp_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RequestOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.identity.request_code(&req.mobile).await?;
    Ok(Json(json!({ "success": true })))
}

/// Exchange a one-time code for a credential, creating the learner on first login.
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid or expired OTP"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn verify_otp_handler(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let auth = state.identity.verify_code(&req.mobile, &req.otp).await?;
    Ok(Json(auth.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mobile_numbers_must_be_ten_digits() {
        assert!(validate_mobile("9876543210").is_ok());
        assert!(validate_mobile("987654321").is_err());
        assert!(validate_mobile("98765432100").is_err());
        assert!(validate_mobile("98765abcde").is_err());
    }

    #[test]
    fn otp_length_is_checked() {
        let req = VerifyOtpRequest {
            mobile: "9876543210".to_string(),
            otp: "12345".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<LoginRequest, _> = serde_json::from_value(json!({
            "email": "a@b.com",
            "password": "secret",
            "role": "admin"
        }));
        assert!(parsed.is_err());
    }
}
