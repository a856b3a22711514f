//! Cookie Transport
//!
//! Moves tokens between HTTP headers and strings. Access tokens are read from
//! the `access-token` cookie, falling back to `Authorization: Bearer`.
//! Refresh tokens are only ever read from their cookie.

use axum::http::{HeaderMap, header};
use platform::cookie::{CookieConfig, extract_bearer, extract_cookie, set_cookie_header};

use crate::application::config::AuthConfig;
use crate::application::token_service::TokenPair;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct CookieTransport {
    cookie: CookieConfig,
    access_name: String,
    refresh_name: String,
    access_max_age: u64,
    refresh_max_age: u64,
}

impl CookieTransport {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            cookie: config.cookie.clone(),
            access_name: config.access_cookie_name.clone(),
            refresh_name: config.refresh_cookie_name.clone(),
            access_max_age: config.access_ttl_secs(),
            refresh_max_age: config.refresh_ttl_secs(),
        }
    }

    /// Append a `Set-Cookie` for `name`
    pub fn write(
        &self,
        headers: &mut HeaderMap,
        name: &str,
        value: &str,
        max_age_secs: u64,
    ) -> AuthResult<()> {
        let cookie = self.cookie.build_set_cookie(name, value, max_age_secs);
        let value = set_cookie_header(&cookie)
            .ok_or_else(|| AuthError::Internal(format!("invalid cookie value for {name}")))?;
        headers.append(header::SET_COOKIE, value);
        Ok(())
    }

    /// A missing `Cookie` header is `None`, not an error
    pub fn read(&self, headers: &HeaderMap, name: &str) -> Option<String> {
        extract_cookie(headers, name)
    }

    /// Append an expired `Set-Cookie` for `name`
    pub fn clear(&self, headers: &mut HeaderMap, name: &str) -> AuthResult<()> {
        let cookie = self.cookie.build_delete_cookie(name);
        let value = set_cookie_header(&cookie)
            .ok_or_else(|| AuthError::Internal(format!("invalid cookie name {name}")))?;
        headers.append(header::SET_COOKIE, value);
        Ok(())
    }

    pub fn read_access(&self, headers: &HeaderMap) -> Option<String> {
        self.read(headers, &self.access_name)
            .or_else(|| extract_bearer(headers))
    }

    pub fn read_refresh(&self, headers: &HeaderMap) -> Option<String> {
        self.read(headers, &self.refresh_name)
    }

    pub fn write_access(&self, headers: &mut HeaderMap, token: &str) -> AuthResult<()> {
        self.write(headers, &self.access_name, token, self.access_max_age)
    }

    pub fn write_pair(&self, headers: &mut HeaderMap, tokens: &TokenPair) -> AuthResult<()> {
        self.write(headers, &self.access_name, &tokens.access, tokens.access_expires_in)?;
        self.write(headers, &self.refresh_name, &tokens.refresh, tokens.refresh_expires_in)
    }

    pub fn clear_all(&self, headers: &mut HeaderMap) -> AuthResult<()> {
        self.clear(headers, &self.access_name)?;
        self.clear(headers, &self.refresh_name)
    }
}
