//! Auth Middleware
//!
//! `authorize` establishes the request identity on every request.
//! `require_authority` guards individual routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::{AuthorizationOutcome, AuthorizeUseCase};
use crate::domain::repository::AuthStore;
use crate::error::{ApiError, AuthError};
use crate::presentation::context::RequestIdentityContext;
use crate::presentation::handlers::AuthAppState;

/// Resolve the caller from its tokens and store a [`RequestIdentityContext`]
///
/// The context is reset to anonymous first, so nothing from a previous
/// request on the same connection or task can survive. Pre-flight requests
/// and public paths skip validation and stay anonymous. Store or signing
/// failures end the request with the structured error body.
pub async fn authorize<R>(
    State(state): State<AuthAppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: AuthStore,
{
    req.extensions_mut().insert(RequestIdentityContext::anonymous());

    if req.method() == Method::OPTIONS || state.config.is_public_path(req.uri().path()) {
        return next.run(req).await;
    }

    let access = state.cookies.read_access(req.headers());
    let refresh = state.cookies.read_refresh(req.headers());

    let use_case = AuthorizeUseCase::new(state.tokens.clone());
    let outcome = match use_case.execute(access.as_deref(), refresh.as_deref()).await {
        Ok(outcome) => outcome,
        Err(e) => return ApiError::new(e, req.uri().path()).into_response(),
    };

    match outcome {
        AuthorizationOutcome::Authenticated {
            principal,
            reissued_access,
        } => {
            req.extensions_mut()
                .insert(RequestIdentityContext::authenticated(principal));

            let mut response = next.run(req).await;

            if let Some(token) = reissued_access {
                if let Err(e) = state.cookies.write_access(response.headers_mut(), &token) {
                    tracing::error!(error = %e, "Failed to write reissued access cookie");
                }
            }

            response
        }
        AuthorizationOutcome::Anonymous => next.run(req).await,
    }
}

/// Reject requests whose identity lacks `authority`
///
/// Install with `from_fn_with_state("article:delete", require_authority)`.
/// Anonymous callers get 401, authenticated callers without the authority
/// get 403.
pub async fn require_authority(
    State(authority): State<&'static str>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let decision = match req
        .extensions()
        .get::<RequestIdentityContext>()
        .and_then(RequestIdentityContext::principal)
    {
        None => Err(AuthError::Unauthenticated),
        Some(principal) if !principal.has_authority(authority) => {
            Err(AuthError::Forbidden(authority.to_string()))
        }
        Some(_) => Ok(()),
    };

    match decision {
        Ok(()) => next.run(req).await,
        Err(e) => {
            let mut response = ApiError::new(e, req.uri().path()).into_response();
            if response.status() == StatusCode::UNAUTHORIZED {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            response
        }
    }
}
