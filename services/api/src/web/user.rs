//! services/api/src/web/user.rs
//!
//! Endpoints for the authenticated learner's own profile.

use axum::{extract::State, Extension, Json};
use learning_core::{Language, Preferences, PreferencesPatch, PublicUser};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::error::ApiError;
use crate::web::{
    extract::{AuthUser, ValidatedJson},
    state::AppState,
};

/// The preference fields a learner may change. Anything else is rejected.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = "validate_not_empty"))]
pub struct UpdatePreferencesRequest {
    /// `english` or `telugu`.
    #[schema(value_type = Option<String>, example = "telugu")]
    pub language: Option<Language>,
    pub notifications: Option<bool>,
    pub voice_enabled: Option<bool>,
    pub onboarding_completed: Option<bool>,
}

impl UpdatePreferencesRequest {
    fn to_patch(&self) -> PreferencesPatch {
        PreferencesPatch {
            language: self.language,
            notifications: self.notifications,
            voice_enabled: self.voice_enabled,
            onboarding_completed: self.onboarding_completed,
        }
    }
}

fn validate_not_empty(req: &UpdatePreferencesRequest) -> Result<(), ValidationError> {
    if req.to_patch().is_empty() {
        let mut err = ValidationError::new("empty_patch");
        err.message = Some("At least one preference field is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PreferencesResponse {
    #[schema(value_type = Object)]
    pub preferences: Preferences,
}

/// Fetch the authenticated learner.
#[utoipa::path(
    get,
    path = "/api/user/me",
    responses(
        (status = 200, description = "The public user record"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "user"
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state.identity.get_by_id(&auth.user_id).await?;
    Ok(Json(user))
}

/// Change some of the authenticated learner's preferences.
#[utoipa::path(
    patch,
    path = "/api/user/me/preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "The updated preferences", body = PreferencesResponse),
        (status = 400, description = "Empty or invalid patch"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "user"
)]
pub async fn update_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let user = state
        .identity
        .patch_preferences(&auth.user_id, req.to_patch())
        .await?;
    Ok(Json(PreferencesResponse {
        preferences: user.preferences,
    }))
}
