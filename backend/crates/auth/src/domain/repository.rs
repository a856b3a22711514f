//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{account::Account, login_attempt::LoginAttempt};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Account lookup
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Find account by (lower-cased) email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>>;
}

/// Append-only login attempt store
#[trait_variant::make(LoginAttemptRepository: Send)]
pub trait LocalLoginAttemptRepository {
    /// Append an attempt
    async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()>;

    /// Attempts for an identifier at or after `since`, newest first
    async fn find_recent(
        &self,
        identifier: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AuthResult<Vec<LoginAttempt>>;
}

/// Everything the HTTP layer needs from a single store
pub trait AuthStore:
    AccountRepository + LoginAttemptRepository + Clone + Send + Sync + 'static
{
}

impl<T> AuthStore for T where
    T: AccountRepository + LoginAttemptRepository + Clone + Send + Sync + 'static
{
}
