//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::authorize;

/// Login, logout and identity routes, to be nested under e.g. `/api/auth`
pub fn auth_router<R>(state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    Router::new()
        .route("/login", post(handlers::login::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .route("/me", get(handlers::me))
        .with_state(state)
}

/// Run [`authorize`] in front of every route of `router`
pub fn with_authorization<R>(router: Router, state: AuthAppState<R>) -> Router
where
    R: AuthStore,
{
    router.layer(middleware::from_fn_with_state(state, authorize::<R>))
}
