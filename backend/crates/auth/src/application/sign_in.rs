//! Sign In Use Case
//!
//! Turns a pending authentication into a token pair:
//! lockout check, credential verification, attempt recording, issuance.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::credential_verifier::CredentialVerifier;
use crate::application::login_attempt_tracker::LoginAttemptTracker;
use crate::application::token_service::{TokenPair, TokenService};
use crate::domain::entity::authentication::Authentication;
use crate::domain::repository::{AccountRepository, LoginAttemptRepository};
use crate::domain::value_object::{
    email::Email, lockout_policy::LockoutDecision, principal::Principal,
};
use crate::error::{AuthError, AuthResult};

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub principal: Principal,
    pub tokens: TokenPair,
}

/// Sign in use case
pub struct SignInUseCase<A, L>
where
    A: AccountRepository,
    L: LoginAttemptRepository,
{
    verifier: CredentialVerifier<A>,
    tracker: Arc<LoginAttemptTracker<L>>,
    tokens: Arc<TokenService<A>>,
}

impl<A, L> SignInUseCase<A, L>
where
    A: AccountRepository,
    L: LoginAttemptRepository,
{
    pub fn new(
        accounts: Arc<A>,
        tracker: Arc<LoginAttemptTracker<L>>,
        tokens: Arc<TokenService<A>>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            verifier: CredentialVerifier::new(accounts, config),
            tracker,
            tokens,
        }
    }

    pub async fn execute(&self, authentication: Authentication) -> AuthResult<SignInOutput> {
        let Authentication::Pending { identifier, secret } = authentication else {
            return Err(AuthError::Internal(
                "sign in requires pending credentials".to_string(),
            ));
        };

        let email = Email::new(&identifier)?;
        let identifier = email.as_str();
        let now = Utc::now();

        if let LockoutDecision::Locked { until } =
            self.tracker.lockout_status(identifier, now).await?
        {
            tracing::warn!(locked_until = %until, "Sign in refused by lockout policy");
            self.tracker.record(identifier, false, now).await?;
            return Err(AuthError::AccountLocked);
        }

        let principal = match self.verifier.authenticate(&email, &secret).await {
            Ok(principal) => principal,
            Err(e) if e.is_authentication_failure() => {
                tracing::info!(reason = e.exception(), error = %e, "Sign in rejected");
                self.tracker.record(identifier, false, now).await?;
                return Err(e);
            }
            // Upstream failures say nothing about the credentials
            Err(e) => return Err(e),
        };

        self.tracker.record(identifier, true, now).await?;
        let tokens = self.tokens.issue_pair(&principal)?;

        tracing::info!(role = %principal.role, "Sign in succeeded");

        Ok(SignInOutput { principal, tokens })
    }
}
