//! services/api/src/web/middleware.rs
//!
//! Authentication and rate-limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::{extract::AuthUser, limiter::RateLimiter, state::AppState};

/// Refuses requests with 429 once the caller's address runs out of tokens.
///
/// Without connection info (a router driven directly, as in tests) every
/// request shares a single bucket.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check(&client) {
        warn!(%client, "Rate limit exceeded");
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(req).await)
}

/// Middleware that validates the bearer credential and extracts the user id.
///
/// If valid, inserts an [`AuthUser`] into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // 2. Strip the bearer scheme
    let token = auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .ok_or(ApiError::Unauthorized)?;

    // 3. Verify the credential, get user_id
    let user_id = state.credentials.verify(token.trim()).map_err(|e| {
        warn!("Rejected credential: {}", e);
        ApiError::Unauthorized
    })?;

    // 4. Insert the user into request extensions
    req.extensions_mut().insert(AuthUser { user_id });

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
