//! Role Value Object
//!
//! Coarse role tag embedded in access tokens next to the fine-grained
//! authorities.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Manager,
    Admin,
    Owner,
}

impl Role {
    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            User => "USER",
            Manager => "MANAGER",
            Admin => "ADMIN",
            Owner => "OWNER",
        }
    }

    /// Parse a role code. Unknown codes are rejected rather than defaulted,
    /// since a token or row carrying one cannot be trusted.
    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code {
            "USER" => Some(User),
            "MANAGER" => Some(Manager),
            "ADMIN" => Some(Admin),
            "OWNER" => Some(Owner),
            _ => {
                tracing::warn!(code, "Unknown role code");
                None
            }
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
