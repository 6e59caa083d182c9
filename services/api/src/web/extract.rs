//! services/api/src/web/extract.rs
//!
//! Request extractors shared by the handlers.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// A JSON body that has been deserialized and then checked with `validator`.
/// Both failures surface as a 400 `ApiError::Validation`, except an oversized
/// body, which stays a 413.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejected)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn rejected(rejection: JsonRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::Validation(rejection.body_text())
    }
}

/// The learner a verified bearer credential belongs to.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}
