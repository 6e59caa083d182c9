//! services/api/src/web/progress.rs
//!
//! Lesson progress endpoints for the authenticated learner.

use axum::{extract::State, Extension, Json};
use learning_core::{LessonSubmission, Progress, ProgressView};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiError;
use crate::web::{
    extract::{AuthUser, ValidatedJson},
    state::AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitLessonRequest {
    #[validate(length(min = 1, message = "moduleKey is required"))]
    pub module_key: String,
    #[validate(length(min = 1, message = "lessonId is required"))]
    pub lesson_id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    #[validate(range(max = 100, message = "Score must be between 0 and 100"))]
    pub score: u32,
}

impl From<SubmitLessonRequest> for LessonSubmission {
    fn from(req: SubmitLessonRequest) -> Self {
        Self {
            module_key: req.module_key,
            lesson_id: req.lesson_id,
            completed: req.completed,
            score: req.score,
        }
    }
}

/// Fetch the learner's progress. Learners with no history get empty lists.
#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "Lessons and badges"),
        (status = 401, description = "Missing or invalid credential")
    ),
    security(("bearer" = [])),
    tag = "progress"
)]
pub async fn get_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProgressView>, ApiError> {
    let view = state.progress.get_progress(&auth.user_id).await?;
    Ok(Json(view))
}

/// Record one attempt at a lesson.
#[utoipa::path(
    post,
    path = "/api/progress/lesson",
    request_body = SubmitLessonRequest,
    responses(
        (status = 200, description = "The updated progress document"),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing or invalid credential")
    ),
    security(("bearer" = [])),
    tag = "progress"
)]
pub async fn submit_lesson_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<SubmitLessonRequest>,
) -> Result<Json<Progress>, ApiError> {
    let progress = state
        .progress
        .submit_lesson(&auth.user_id, req.into())
        .await?;
    Ok(Json(progress))
}
