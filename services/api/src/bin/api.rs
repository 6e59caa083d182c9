//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        Argon2Hasher, JwtCredentials, MemoryCodeStore, MemoryDocumentStore, PgDocumentStore,
        SystemClock,
    },
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, Adapters, AppState, RateLimiter},
};
use axum::Router;
use learning_core::ports::{Clock, DocumentStoreService};
use learning_core::workflows::OneTimeCodePolicy;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Document Store ---
    let store: Arc<dyn DocumentStoreService> = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let pg_store = PgDocumentStore::new(db_pool);
            info!("Running database migrations...");
            pg_store.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(pg_store)
        }
        None => {
            warn!("DATABASE_URL is not set; documents are kept in memory and lost on restart");
            Arc::new(MemoryDocumentStore::with_app_indexes())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let adapters = Adapters {
        store,
        clock: clock.clone(),
        passwords: Arc::new(Argon2Hasher::default()),
        credentials: Arc::new(JwtCredentials::new(
            &config.jwt_secret,
            chrono::Duration::days(config.jwt_ttl_days),
        )),
        codes: Arc::new(MemoryCodeStore::new(clock)),
    };
    if config.otp_fixed_code.is_some() {
        warn!("OTP_FIXED_CODE is set; every one-time code will be the same");
    }
    let policy = OneTimeCodePolicy {
        ttl: chrono::Duration::seconds(config.otp_ttl_seconds),
        fixed_code: config.otp_fixed_code.clone(),
        max_attempts: config.otp_max_attempts,
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(adapters, policy));

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(
            app_state,
            config.client_origin.clone(),
            Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
        ))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
