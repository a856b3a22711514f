//! In-Memory Repository Implementations
//!
//! Backs development servers and tests. Attempts are append-only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::{account::Account, login_attempt::LoginAttempt};
use crate::domain::repository::{AccountRepository, LoginAttemptRepository};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

#[derive(Clone, Default)]
pub struct InMemoryAuthRepository {
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    attempts: Arc<RwLock<Vec<LoginAttempt>>>,
    latency: Option<Duration>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call, to simulate a slow store
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert or replace an account keyed by its email
    pub async fn insert_account(&self, account: Account) {
        self.accounts
            .write()
            .await
            .insert(account.email.as_str().to_string(), account);
    }

    /// All recorded attempts for an identifier, oldest first
    pub async fn attempts_for(&self, identifier: &str) -> Vec<LoginAttempt> {
        self.attempts
            .read()
            .await
            .iter()
            .filter(|a| a.identifier == identifier)
            .cloned()
            .collect()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl AccountRepository for InMemoryAuthRepository {
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Account>> {
        self.simulate_latency().await;
        Ok(self.accounts.read().await.get(email.as_str()).cloned())
    }
}

impl LoginAttemptRepository for InMemoryAuthRepository {
    async fn append(&self, attempt: &LoginAttempt) -> AuthResult<()> {
        self.simulate_latency().await;
        self.attempts.write().await.push(attempt.clone());
        Ok(())
    }

    async fn find_recent(
        &self,
        identifier: &str,
        since: DateTime<Utc>,
        limit: usize,
    ) -> AuthResult<Vec<LoginAttempt>> {
        self.simulate_latency().await;
        let mut recent: Vec<LoginAttempt> = self
            .attempts
            .read()
            .await
            .iter()
            .rev()
            .filter(|a| a.identifier == identifier && a.attempted_at >= since)
            .cloned()
            .collect();

        // Stable sort over reversed insertion keeps ties newest first
        recent.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
        recent.truncate(limit);
        Ok(recent)
    }
}
