//! HTTP Handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{LoginAttemptTracker, SignInUseCase, TokenService};
use crate::domain::entity::authentication::Authentication;
use crate::domain::repository::AuthStore;
use crate::error::{ApiError, AuthError};
use crate::presentation::context::RequestIdentityContext;
use crate::presentation::cookies::CookieTransport;
use crate::presentation::dto::{LoginRequest, LoginResponse, PrincipalResponse};

/// Shared state for auth handlers and the authorization layer
#[derive(Clone)]
pub struct AuthAppState<R>
where
    R: AuthStore,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService<R>>,
    pub tracker: Arc<LoginAttemptTracker<R>>,
    pub cookies: CookieTransport,
}

impl<R> AuthAppState<R>
where
    R: AuthStore,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        let repo = Arc::new(repo);
        let config = Arc::new(config);
        Self {
            tokens: Arc::new(TokenService::new(repo.clone(), config.clone())),
            tracker: Arc::new(LoginAttemptTracker::new(repo.clone(), config.clone())),
            cookies: CookieTransport::from_config(&config),
            repo,
            config,
        }
    }
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    R: AuthStore,
{
    let path = uri.path().to_string();

    let Json(req) = body.map_err(|rejection| {
        ApiError::new(AuthError::MalformedRequest(rejection.body_text()), &path)
    })?;

    let use_case = SignInUseCase::new(
        state.repo.clone(),
        state.tracker.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(Authentication::pending(req.email, req.password))
        .await
        .map_err(|e| ApiError::new(e, &path))?;

    let mut headers = HeaderMap::new();
    state
        .cookies
        .write_pair(&mut headers, &output.tokens)
        .map_err(|e| ApiError::new(e, &path))?;

    let body = LoginResponse {
        subject: output.principal.id.clone(),
        role: output.principal.role.code().to_string(),
        authorities: output.principal.authorities.joined(),
        access_expires_in: output.tokens.access_expires_in,
        refresh_expires_in: output.tokens.refresh_expires_in,
    };

    Ok((StatusCode::OK, headers, Json(body)))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
///
/// Tokens are stateless; logging out only tells the client to drop them.
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, ApiError>
where
    R: AuthStore,
{
    let mut headers = HeaderMap::new();
    state
        .cookies
        .clear_all(&mut headers)
        .map_err(|e| ApiError::new(e, uri.path()))?;

    Ok((StatusCode::NO_CONTENT, headers))
}

// ============================================================================
// Current identity
// ============================================================================

/// GET /api/auth/me
pub async fn me(
    OriginalUri(uri): OriginalUri,
    identity: RequestIdentityContext,
) -> Result<Json<PrincipalResponse>, ApiError> {
    let principal = identity
        .principal()
        .ok_or_else(|| ApiError::new(AuthError::Unauthenticated, uri.path()))?;

    Ok(Json(PrincipalResponse::from(principal)))
}
