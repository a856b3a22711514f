//! Credential Verifier
//!
//! Checks a supplied password against the stored hash after the account
//! status gates. Gates are evaluated in a fixed order and the first failure
//! is returned:
//!
//! 1. account exists (`AccountNotFound`)
//! 2. credentials not expired (`CredentialsExpired`)
//! 3. account not locked (`AccountLocked`)
//! 4. account enabled (`AccountDisabled`)
//! 5. account not expired (`AccountExpired`)
//! 6. password matches (`BadCredentials`)

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::AuthConfig;
use crate::application::upstream::with_timeout;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{email::Email, principal::Principal};
use crate::error::{AuthError, AuthResult};

pub struct CredentialVerifier<A>
where
    A: AccountRepository,
{
    accounts: Arc<A>,
    config: Arc<AuthConfig>,
}

impl<A> CredentialVerifier<A>
where
    A: AccountRepository,
{
    pub fn new(accounts: Arc<A>, config: Arc<AuthConfig>) -> Self {
        Self { accounts, config }
    }

    pub async fn authenticate(
        &self,
        email: &Email,
        secret: &ClearTextPassword,
    ) -> AuthResult<Principal> {
        let account = with_timeout(
            self.config.upstream_timeout,
            "account lookup",
            self.accounts.find_by_email(email),
        )
        .await?;

        let Some(account) = account else {
            // Spend the same hashing work as a wrong password would
            if let Some(decoy) = &self.config.decoy_hash {
                let _ = decoy.verify(secret, self.config.pepper());
            }
            return Err(AuthError::AccountNotFound);
        };

        let status = account.status;
        if !status.credentials_non_expired {
            return Err(AuthError::CredentialsExpired);
        }
        if !status.account_non_locked {
            return Err(AuthError::AccountLocked);
        }
        if !status.enabled {
            return Err(AuthError::AccountDisabled);
        }
        if !status.account_non_expired {
            return Err(AuthError::AccountExpired);
        }

        if !account.password_hash.verify(secret, self.config.pepper()) {
            return Err(AuthError::BadCredentials);
        }

        Ok(account.principal())
    }
}
