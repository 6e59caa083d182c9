//! services/api/src/web/voice.rs
//!
//! Scores a spoken transcript against the phrase the learner was asked to say.

use axum::Json;
use learning_core::scoring::{self, TranscriptScore};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::ApiError;
use crate::web::extract::{AuthUser, ValidatedJson};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 1000, message = "expected must be 1-1000 characters"))]
    pub expected: String,
    #[validate(length(min = 1, max = 5000, message = "transcript must be 1-5000 characters"))]
    pub transcript: String,
}

/// Percentages in `0..=100`. `score` is the F1 of precision and recall.
#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluateResponse {
    pub score: u32,
    pub precision: u32,
    pub recall: u32,
}

impl From<TranscriptScore> for EvaluateResponse {
    fn from(score: TranscriptScore) -> Self {
        Self {
            score: score.score,
            precision: score.precision,
            recall: score.recall,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/voice/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Transcript scored", body = EvaluateResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing or invalid credential")
    ),
    security(("bearer" = [])),
    tag = "voice"
)]
pub async fn evaluate_handler(
    axum::Extension(_auth): axum::Extension<AuthUser>,
    ValidatedJson(req): ValidatedJson<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let score = scoring::evaluate(&req.expected, &req.transcript);
    Ok(Json(score.into()))
}
