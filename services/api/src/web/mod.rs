pub mod auth;
pub mod extract;
pub mod limiter;
pub mod middleware;
pub mod progress;
pub mod rest;
pub mod state;
pub mod user;
pub mod voice;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{self, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

pub use limiter::RateLimiter;
pub use middleware::{rate_limit, require_auth};
pub use state::{Adapters, AppState};

/// Largest JSON body accepted by any endpoint.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Builds the complete API router: public auth routes, bearer-protected routes,
/// and the shared layers (rate limit, body limit, CORS, security headers, tracing).
pub fn router(
    state: Arc<AppState>,
    client_origin: Option<HeaderValue>,
    limiter: Arc<RateLimiter>,
) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(rest::health_handler))
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/request-otp", post(auth::request_otp_handler))
        .route("/api/auth/verify-otp", post(auth::verify_otp_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/user/me", get(user::me_handler))
        .route(
            "/api/user/me/preferences",
            patch(user::update_preferences_handler),
        )
        .route("/api/progress", get(progress::get_progress_handler))
        .route("/api/progress/lesson", post(progress::submit_lesson_handler))
        .route("/api/voice/evaluate", post(voice::evaluate_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Credentials cannot be combined with a wildcard origin, so "any" mirrors the caller.
    let allow_origin = match client_origin {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::mirror_request(),
    };
    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(rest::not_found_handler)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(axum_middleware::from_fn_with_state(limiter, rate_limit))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
