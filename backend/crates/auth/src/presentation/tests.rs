//! HTTP-level tests driving the full router

use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::get;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::application::TokenKind;
use crate::domain::value_object::{
    account_status::AccountStatus, authorities::Authorities, principal::Principal, role::Role,
};
use crate::infra::memory::InMemoryAuthRepository;
use crate::presentation::{
    AuthAppState, RequestIdentityContext, auth_router, require_authority, with_authorization,
};
use crate::test_support::{FULL_ARTICLE_AUTHORITIES, account, test_config};

async fn whoami(identity: RequestIdentityContext) -> String {
    identity.principal_id().to_string()
}

async fn ok() -> &'static str {
    "ok"
}

fn app_with(
    repo: InMemoryAuthRepository,
    configure: impl FnOnce(&mut crate::AuthConfig),
) -> (Router, AuthAppState<InMemoryAuthRepository>) {
    let mut config = test_config()
        .with_public_path("/api/auth/login")
        .with_public_path("/health");
    configure(&mut config);
    let state = AuthAppState::new(repo, config);

    let articles = Router::new()
        .route("/api/articles", get(ok))
        .route_layer(from_fn_with_state("article:read", require_authority));
    let admin = Router::new()
        .route("/api/admin", get(ok))
        .route_layer(from_fn_with_state("admin:manage", require_authority));

    let app = Router::new()
        .nest("/api/auth", auth_router(state.clone()))
        .merge(articles)
        .merge(admin)
        .route("/api/whoami", get(whoami).options(whoami))
        .route("/health", get(whoami));

    (with_authorization(app, state.clone()), state)
}

async fn app() -> (Router, AuthAppState<InMemoryAuthRepository>, InMemoryAuthRepository) {
    let repo = InMemoryAuthRepository::new();
    repo.insert_account(account("u@x.com", "correct", AccountStatus::active()))
        .await;
    let (app, state) = app_with(repo.clone(), |_| {});
    (app, state, repo)
}

fn principal() -> Principal {
    Principal::new("u@x.com", Authorities::parse(FULL_ARTICLE_AUTHORITIES), Role::User)
}

fn login_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

fn cookie_value(set_cookies: &[String], name: &str) -> Option<String> {
    set_cookies.iter().find_map(|c| {
        let pair = c.split(';').next()?;
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn assert_envelope(body: &Value, status: u16, exception: &str, path: &str) {
    assert_eq!(body["code"], status);
    assert_eq!(body["status"], status);
    assert_eq!(body["exception"], exception);
    assert_eq!(body["path"], path);
    assert!(body["time"].is_string());
    assert!(body["message"].is_string());
    assert_eq!(body["data"], Value::Null);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_sets_both_cookies_and_returns_principal() {
    let (app, state, _) = app().await;

    let response = app
        .oneshot(login_request(json!({"email": "u@x.com", "password": "correct"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let access = cookie_value(&cookies, "access-token").unwrap();
    assert!(cookie_value(&cookies, "refresh-token").is_some());
    assert!(cookies.iter().any(|c| c.starts_with("access-token=") && c.contains("Max-Age=120")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh-token=") && c.contains("Max-Age=7200")));

    let body = body_json(response).await;
    assert_eq!(body["subject"], "u@x.com");
    assert_eq!(body["role"], "USER");
    assert_eq!(body["authorities"], FULL_ARTICLE_AUTHORITIES);
    assert_eq!(body["accessExpiresIn"], 120);
    assert_eq!(body["refreshExpiresIn"], 7200);

    let claims = state.tokens.validate_access(&access).await.unwrap();
    assert_eq!(claims.principal(), principal());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let (app, _, _) = app().await;

    let wrong = app
        .clone()
        .oneshot(login_request(json!({"email": "u@x.com", "password": "nope"})))
        .await
        .unwrap();
    let unknown = app
        .oneshot(login_request(json!({"email": "ghost@x.com", "password": "correct"})))
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&wrong).is_empty());

    let wrong = body_json(wrong).await;
    let unknown = body_json(unknown).await;
    assert_envelope(&wrong, 401, "BadCredentials", "/api/auth/login");
    assert_envelope(&unknown, 401, "BadCredentials", "/api/auth/login");
    assert_eq!(wrong["message"], "Unable to authenticate");
    assert_eq!(wrong["message"], unknown["message"]);
}

#[tokio::test]
async fn malformed_login_body_is_bad_request() {
    let (app, _, _) = app().await;

    let response = app
        .oneshot(login_request(json!({"email": "u@x.com"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_envelope(&body_json(response).await, 400, "MalformedRequest", "/api/auth/login");
}

#[tokio::test]
async fn disabled_account_is_rejected_and_recorded_once() {
    let repo = InMemoryAuthRepository::new();
    repo.insert_account(account(
        "u@x.com",
        "correct",
        AccountStatus {
            enabled: false,
            ..AccountStatus::active()
        },
    ))
    .await;
    let (app, _) = app_with(repo.clone(), |_| {});

    let response = app
        .oneshot(login_request(json!({"email": "u@x.com", "password": "correct"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_envelope(&body_json(response).await, 401, "AccountDisabled", "/api/auth/login");

    let attempts = repo.attempts_for("u@x.com").await;
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].success);
}

// ============================================================================
// Authorization state machine
// ============================================================================

#[tokio::test]
async fn valid_access_cookie_authenticates() {
    let (app, state, _) = app().await;
    let access = state.tokens.issue(&principal(), TokenKind::Access).unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", Some(format!("access-token={access}"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let body = body_json(response).await;
    assert_eq!(body["subject"], "u@x.com");
    assert_eq!(body["authorities"], FULL_ARTICLE_AUTHORITIES);
}

#[tokio::test]
async fn bearer_header_is_equivalent_to_cookie() {
    let (app, state, _) = app().await;
    let access = state.tokens.issue(&principal(), TokenKind::Access).unwrap();

    let request = Request::builder()
        .uri("/api/whoami")
        .header(header::AUTHORIZATION, format!("Bearer {access}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(body_text(response).await, "u@x.com");
}

#[tokio::test]
async fn expired_access_with_valid_refresh_gets_new_access_cookie() {
    let (app, state, _) = app().await;
    let expired = state
        .tokens
        .issue_at(&principal(), TokenKind::Access, Utc::now() - Duration::minutes(5))
        .unwrap();
    let refresh = state.tokens.issue(&principal(), TokenKind::Refresh).unwrap();

    let response = app
        .oneshot(get_with_cookie(
            "/api/whoami",
            Some(format!("access-token={expired}; refresh-token={refresh}")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    let fresh = cookie_value(&cookies, "access-token").unwrap();
    assert_ne!(fresh, expired);
    assert!(cookie_value(&cookies, "refresh-token").is_none());
    assert_eq!(body_text(response).await, "u@x.com");

    let claims = state.tokens.validate_access(&fresh).await.unwrap();
    assert_eq!(claims.subject(), "u@x.com");
}

#[tokio::test]
async fn refresh_reissue_reflects_current_authorities() {
    let (app, state, repo) = app().await;
    let refresh = state.tokens.issue(&principal(), TokenKind::Refresh).unwrap();

    let mut demoted = account("u@x.com", "correct", AccountStatus::active());
    demoted.authorities = Authorities::parse("paper:read");
    repo.insert_account(demoted).await;

    let response = app
        .oneshot(get_with_cookie(
            "/api/articles",
            Some(format!("refresh-token={refresh}")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let fresh = cookie_value(&set_cookies(&response), "access-token").unwrap();
    let claims = state.tokens.validate_access(&fresh).await.unwrap();
    assert_eq!(claims.authorities().joined(), "paper:read");
    assert_envelope(&body_json(response).await, 403, "AccessDenied", "/api/articles");
}

#[tokio::test]
async fn tampered_token_without_refresh_is_anonymous() {
    let (app, state, _) = app().await;
    let access = state.tokens.issue(&principal(), TokenKind::Access).unwrap();
    let mut tampered = access.into_bytes();
    let last = tampered.len() - 2;
    tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/whoami", Some(format!("access-token={tampered}"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "0");
}

#[tokio::test]
async fn anonymous_request_sees_sentinel() {
    let (app, _, _) = app().await;
    let response = app.oneshot(get_with_cookie("/api/whoami", None)).await.unwrap();
    assert_eq!(body_text(response).await, "0");
}

#[tokio::test]
async fn preflight_and_public_paths_skip_validation() {
    let (app, state, _) = app().await;
    let access = state.tokens.issue(&principal(), TokenKind::Access).unwrap();

    let preflight = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/whoami")
        .header(header::COOKIE, format!("access-token={access}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(preflight).await.unwrap();
    assert_eq!(body_text(response).await, "0");

    let response = app
        .oneshot(get_with_cookie("/health", Some(format!("access-token={access}"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "0");
}

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    let repo = InMemoryAuthRepository::new().with_latency(StdDuration::from_millis(200));
    let (app, state) = app_with(repo, |config| {
        config.upstream_timeout = StdDuration::from_millis(20);
    });
    let access = state.tokens.issue(&principal(), TokenKind::Access).unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/whoami", Some(format!("access-token={access}"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_envelope(&body_json(response).await, 503, "UpstreamUnavailable", "/api/whoami");
}

#[tokio::test]
async fn concurrent_requests_keep_their_own_identity() {
    let repo = InMemoryAuthRepository::new();
    for email in ["a@x.com", "b@x.com"] {
        repo.insert_account(account(email, "correct", AccountStatus::active()))
            .await;
    }
    let (app, state) = app_with(repo, |_| {});
    let state = Arc::new(state);

    let mut handles = Vec::new();
    for i in 0..40 {
        let subject = if i % 2 == 0 { "a@x.com" } else { "b@x.com" };
        let principal = Principal::new(subject, Authorities::empty(), Role::User);
        let access = state.tokens.issue(&principal, TokenKind::Access).unwrap();
        let app = app.clone();
        // Every fourth request is anonymous
        let cookie = (i % 4 != 3).then(|| format!("access-token={access}"));
        let expected = if cookie.is_some() { subject } else { "0" };

        handles.push(tokio::spawn(async move {
            let response = app
                .oneshot(get_with_cookie("/api/whoami", cookie))
                .await
                .unwrap();
            (expected, body_text(response).await)
        }));
    }

    for handle in handles {
        let (expected, actual) = handle.await.unwrap();
        assert_eq!(actual, expected);
    }
}

// ============================================================================
// Authority guard, logout, identity
// ============================================================================

#[tokio::test]
async fn guard_distinguishes_anonymous_from_forbidden() {
    let (app, state, _) = app().await;
    let access = state.tokens.issue(&principal(), TokenKind::Access).unwrap();

    let anonymous = app
        .clone()
        .oneshot(get_with_cookie("/api/articles", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert!(anonymous.headers().contains_key(header::WWW_AUTHENTICATE));
    assert_envelope(&body_json(anonymous).await, 401, "Unauthenticated", "/api/articles");

    let allowed = app
        .clone()
        .oneshot(get_with_cookie("/api/articles", Some(format!("access-token={access}"))))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);

    let forbidden = app
        .oneshot(get_with_cookie("/api/admin", Some(format!("access-token={access}"))))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn me_requires_identity() {
    let (app, _, _) = app().await;
    let response = app.oneshot(get_with_cookie("/api/auth/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_envelope(&body_json(response).await, 401, "Unauthenticated", "/api/auth/me");
}

#[tokio::test]
async fn logout_clears_both_cookies() {
    let (app, _, _) = app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert_eq!(cookie_value(&cookies, "access-token").as_deref(), Some(""));
    assert_eq!(cookie_value(&cookies, "refresh-token").as_deref(), Some(""));
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}
