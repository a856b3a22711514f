//! Authorize Use Case
//!
//! Per-request token state machine. Given the access and refresh tokens a
//! request carries, decide who the caller is:
//!
//! - valid access token: authenticated from its claims
//! - otherwise a valid refresh token: authenticated from the account's
//!   current state, with a newly issued access token to hand back
//! - otherwise anonymous
//!
//! Invalid or expired tokens are ordinary traffic and fall through to the
//! next state. Store outages and signing failures are returned as errors.

use std::sync::Arc;

use crate::application::token_service::TokenService;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::principal::Principal;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoToken,
    ValidAccess,
    ExpiredOrInvalidAccess,
    ValidRefresh,
    InvalidRefresh,
}

impl TokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenState::NoToken => "no_token",
            TokenState::ValidAccess => "valid_access",
            TokenState::ExpiredOrInvalidAccess => "expired_or_invalid_access",
            TokenState::ValidRefresh => "valid_refresh",
            TokenState::InvalidRefresh => "invalid_refresh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Authenticated {
        principal: Principal,
        /// Set when the identity came from the refresh token
        reissued_access: Option<String>,
    },
    Anonymous,
}

pub struct AuthorizeUseCase<A>
where
    A: AccountRepository,
{
    tokens: Arc<TokenService<A>>,
}

impl<A> AuthorizeUseCase<A>
where
    A: AccountRepository,
{
    pub fn new(tokens: Arc<TokenService<A>>) -> Self {
        Self { tokens }
    }

    pub async fn execute(
        &self,
        access: Option<&str>,
        refresh: Option<&str>,
    ) -> AuthResult<AuthorizationOutcome> {
        let mut state = TokenState::NoToken;

        if let Some(token) = access {
            match self.tokens.validate_access(token).await {
                Ok(claims) => {
                    tracing::debug!(state = TokenState::ValidAccess.as_str(), "Token state");
                    return Ok(AuthorizationOutcome::Authenticated {
                        principal: claims.principal(),
                        reissued_access: None,
                    });
                }
                Err(e) => {
                    fall_through(e)?;
                    state = TokenState::ExpiredOrInvalidAccess;
                }
            }
        }

        if let Some(token) = refresh {
            match self.tokens.validate_refresh(token).await {
                Ok(claims) => {
                    let access = self.tokens.reissue_access(&claims)?;
                    tracing::debug!(
                        previous = state.as_str(),
                        state = TokenState::ValidRefresh.as_str(),
                        "Reissued access token"
                    );
                    return Ok(AuthorizationOutcome::Authenticated {
                        principal: claims.current_principal().clone(),
                        reissued_access: Some(access),
                    });
                }
                Err(e) => {
                    fall_through(e)?;
                    state = TokenState::InvalidRefresh;
                }
            }
        }

        tracing::debug!(state = state.as_str(), "Proceeding anonymously");
        Ok(AuthorizationOutcome::Anonymous)
    }
}

/// Swallow token failures, pass everything else up
fn fall_through(error: AuthError) -> AuthResult<()> {
    if error.is_authentication_failure() {
        tracing::debug!(reason = error.exception(), "Token rejected");
        Ok(())
    } else {
        Err(error)
    }
}
