//! Principal Value Object
//!
//! Identity snapshot embedded in an access token at issuance time. It is not
//! re-derived from storage on every request, so it can lag behind the account
//! until the access token expires.

use serde::{Deserialize, Serialize};

use crate::domain::value_object::{authorities::Authorities, role::Role};

/// Subject id used when a request carries no identity
pub const ANONYMOUS_ID: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub authorities: Authorities,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, authorities: Authorities, role: Role) -> Self {
        Self {
            id: id.into(),
            authorities,
            role,
        }
    }

    #[inline]
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}
