//! Authentication State
//!
//! The three states an authentication can be in. There is no way to flip an
//! existing value to authenticated: a new `Authenticated` value is only built
//! from a verified [`Principal`].

use std::fmt;

use platform::password::ClearTextPassword;

use crate::domain::value_object::principal::{ANONYMOUS_ID, Principal};

pub enum Authentication {
    /// No identity established
    Anonymous,
    /// Credentials supplied, not yet verified
    Pending {
        identifier: String,
        secret: ClearTextPassword,
    },
    /// Verified identity
    Authenticated { principal: Principal },
}

impl Authentication {
    pub fn pending(identifier: impl Into<String>, secret: String) -> Self {
        Authentication::Pending {
            identifier: identifier.into(),
            secret: ClearTextPassword::new(secret),
        }
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Authentication::Authenticated { .. })
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Authentication::Authenticated { principal } => Some(principal),
            Authentication::Anonymous | Authentication::Pending { .. } => None,
        }
    }

    /// Subject id, or the anonymous sentinel
    pub fn principal_id(&self) -> &str {
        match self {
            Authentication::Authenticated { principal } => &principal.id,
            Authentication::Anonymous | Authentication::Pending { .. } => ANONYMOUS_ID,
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authentication::Anonymous => f.write_str("Anonymous"),
            Authentication::Pending { identifier, .. } => f
                .debug_struct("Pending")
                .field("identifier", identifier)
                .field("secret", &"[REDACTED]")
                .finish(),
            Authentication::Authenticated { principal } => f
                .debug_struct("Authenticated")
                .field("principal", principal)
                .finish(),
        }
    }
}
