//! Login Attempt Entity
//!
//! Append-only record of one authentication attempt. Never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginAttempt {
    pub identifier: String,
    pub attempted_at: DateTime<Utc>,
    pub success: bool,
}

impl LoginAttempt {
    pub fn new(identifier: impl Into<String>, success: bool, attempted_at: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            attempted_at,
            success,
        }
    }
}
