//! Account Entity
//!
//! Backing record for a principal: credentials, status gates and the
//! authority snapshot copied into tokens.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{
    account_status::AccountStatus, authorities::Authorities, email::Email, principal::Principal,
    role::Role,
};

#[derive(Debug, Clone)]
pub struct Account {
    /// Login identifier and principal id
    pub email: Email,
    pub password_hash: HashedPassword,
    pub role: Role,
    pub authorities: Authorities,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create an active account
    pub fn new(
        email: Email,
        password_hash: HashedPassword,
        role: Role,
        authorities: Authorities,
    ) -> Self {
        let now = Utc::now();
        Self {
            email,
            password_hash,
            role,
            authorities,
            status: AccountStatus::active(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Snapshot used for token issuance
    pub fn principal(&self) -> Principal {
        Principal::new(self.email.as_str(), self.authorities.clone(), self.role)
    }

    #[inline]
    pub fn is_usable(&self) -> bool {
        self.status.is_usable()
    }
}
