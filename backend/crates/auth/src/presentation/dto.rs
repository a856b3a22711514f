//! Data Transfer Objects

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::value_object::principal::Principal;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub subject: String,
    pub role: String,
    /// Comma-joined
    pub authorities: String,
    pub access_expires_in: u64,
    pub refresh_expires_in: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalResponse {
    pub subject: String,
    pub role: String,
    pub authorities: String,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            subject: principal.id.clone(),
            role: principal.role.code().to_string(),
            authorities: principal.authorities.joined(),
        }
    }
}
