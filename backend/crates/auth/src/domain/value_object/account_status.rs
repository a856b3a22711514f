//! Account Status Value Object
//!
//! Four independent gates on an account's backing record. All four must
//! hold for authentication to succeed.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub enabled: bool,
    pub account_non_locked: bool,
    pub account_non_expired: bool,
    pub credentials_non_expired: bool,
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self::active()
    }
}

impl AccountStatus {
    /// All gates open
    pub const fn active() -> Self {
        Self {
            enabled: true,
            account_non_locked: true,
            account_non_expired: true,
            credentials_non_expired: true,
        }
    }

    /// True when every gate holds
    #[inline]
    pub const fn is_usable(&self) -> bool {
        self.enabled
            && self.account_non_locked
            && self.account_non_expired
            && self.credentials_non_expired
    }
}
