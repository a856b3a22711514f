//! Request Identity Context
//!
//! Per-request identity carried in the request extensions. The authorization
//! middleware inserts it before anything else runs, so handlers and audit
//! code always find one. It lives and dies with the request.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::entity::authentication::Authentication;
use crate::domain::value_object::principal::Principal;
use crate::error::AuthError;

#[derive(Debug, Clone)]
pub struct RequestIdentityContext {
    authentication: Arc<Authentication>,
}

impl RequestIdentityContext {
    pub fn anonymous() -> Self {
        Self {
            authentication: Arc::new(Authentication::Anonymous),
        }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            authentication: Arc::new(Authentication::Authenticated { principal }),
        }
    }

    pub fn authentication(&self) -> &Authentication {
        &self.authentication
    }

    /// Subject id, or `"0"` when anonymous
    pub fn principal_id(&self) -> &str {
        self.authentication.principal_id()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.authentication.principal()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication.is_authenticated()
    }
}

impl<S> FromRequestParts<S> for RequestIdentityContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentityContext>()
            .cloned()
            .ok_or_else(|| {
                AuthError::Internal(
                    "identity context missing; authorization layer not installed".into(),
                )
            })
    }
}
