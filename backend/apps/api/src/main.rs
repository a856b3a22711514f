//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors go through
//! `auth::ApiError`.

use auth::{
    AuthAppState, AuthConfig, PgAuthRepository, RequestIdentityContext, auth_router,
    require_authority, with_authorization,
};
use axum::{
    Json, Router, http,
    http::{Method, header},
    middleware::from_fn_with_state,
    routing::get,
};
use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long login attempts are kept
const ATTEMPT_RETENTION_DAYS: i64 = 30;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Signing key problems must stop startup
    let auth_config = if cfg!(debug_assertions) && env::var("AUTH_SIGNING_KEY").is_err() {
        tracing::warn!("AUTH_SIGNING_KEY not set, using a random development key");
        AuthConfig::development()?
    } else {
        AuthConfig::from_env()?
    };
    let auth_config = auth_config
        .with_public_path("/api/auth/login")
        .with_public_path("/api/auth/logout")
        .with_public_path("/health")
        .with_decoy_hash()?;

    // Database connection
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set in environment"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Startup cleanup: prune old login attempts
    // Errors here should not prevent server startup
    let auth_store = PgAuthRepository::new(pool.clone());
    match auth_store
        .prune_attempts(Utc::now() - Duration::days(ATTEMPT_RETENTION_DAYS))
        .await
    {
        Ok(deleted) => {
            tracing::info!(attempts_deleted = deleted, "Login attempt cleanup completed");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Login attempt cleanup failed, continuing anyway"
            );
        }
    }

    let auth_state = AuthAppState::new(auth_store, auth_config);

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Routes that need an authority
    let articles = Router::new()
        .route("/api/articles", get(list_articles))
        .route_layer(from_fn_with_state("article:read", require_authority));

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_router(auth_state.clone()))
        .merge(articles)
        .route("/health", get(health));

    let app = with_authorization(app, auth_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 31113));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}

/// GET /api/articles
///
/// Placeholder resource behind `article:read`.
async fn list_articles(identity: RequestIdentityContext) -> Json<serde_json::Value> {
    tracing::info!(principal = identity.principal_id(), "Listing articles");
    Json(serde_json::json!({ "articles": [], "requestedBy": identity.principal_id() }))
}
