//! Application Configuration
//!
//! Built once at startup and shared as `Arc<AuthConfig>`.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::{from_base64, random_bytes, to_base64};
use platform::password::{ClearTextPassword, HashedPassword, PasswordHashParams};
use platform::signed_token::{MIN_KEY_LEN, SigningKey};

use crate::domain::value_object::lockout_policy::LockoutPolicy;
use crate::error::{AuthError, AuthResult};

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

pub const DEFAULT_ACCESS_COOKIE: &str = "access-token";
pub const DEFAULT_REFRESH_COOKIE: &str = "refresh-token";
pub const DEFAULT_AUDIENCE: &str = "api";

/// Upper bound for either token lifetime
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC-SHA512 signing key (at least 64 bytes)
    pub signing_key: SigningKey,
    /// Audience claim written into and required from every token
    pub audience: String,
    /// Access token lifetime (2 minutes)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (2 hours)
    pub refresh_token_ttl: Duration,
    pub access_cookie_name: String,
    pub refresh_cookie_name: String,
    /// Attributes for both token cookies
    pub cookie: CookieConfig,
    /// Path prefixes that skip token validation
    pub public_paths: Vec<String>,
    pub lockout: LockoutPolicy,
    /// How long a cached attempt history stays fresh
    pub attempt_cache_ttl: Duration,
    /// 0 disables the attempt cache
    pub attempt_cache_capacity: usize,
    /// Limit on each account or attempt store call
    pub upstream_timeout: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Argon2 cost for hashes produced by this service
    pub password_params: PasswordHashParams,
    /// Verified against on unknown identifiers so they cost as much as a
    /// wrong password
    pub decoy_hash: Option<HashedPassword>,
}

impl AuthConfig {
    /// Config with defaults around the given key
    pub fn new(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            audience: DEFAULT_AUDIENCE.to_string(),
            access_token_ttl: Duration::from_secs(120),
            refresh_token_ttl: Duration::from_secs(7200),
            access_cookie_name: DEFAULT_ACCESS_COOKIE.to_string(),
            refresh_cookie_name: DEFAULT_REFRESH_COOKIE.to_string(),
            cookie: CookieConfig::default(),
            public_paths: Vec::new(),
            lockout: LockoutPolicy::default(),
            attempt_cache_ttl: Duration::from_secs(30),
            attempt_cache_capacity: 10_000,
            upstream_timeout: Duration::from_secs(5),
            password_pepper: None,
            password_params: PasswordHashParams::default(),
            decoy_hash: None,
        }
    }

    /// Create config with a random signing key
    pub fn with_random_key() -> AuthResult<Self> {
        let key = SigningKey::new(random_bytes(MIN_KEY_LEN))
            .map_err(|e| AuthError::SigningMisconfigured(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> AuthResult<Self> {
        let mut config = Self::with_random_key()?;
        config.cookie.secure = false;
        Ok(config)
    }

    /// Load from environment variables
    ///
    /// `AUTH_SIGNING_KEY` is required. A missing or short key is
    /// `SigningMisconfigured` and must stop the service from starting.
    pub fn from_env() -> AuthResult<Self> {
        let raw_key = std::env::var("AUTH_SIGNING_KEY")
            .map_err(|_| AuthError::SigningMisconfigured("AUTH_SIGNING_KEY is not set".into()))?;
        let key_bytes = from_base64(&raw_key).map_err(|_| {
            AuthError::SigningMisconfigured("AUTH_SIGNING_KEY is not valid base64".into())
        })?;
        let signing_key =
            SigningKey::new(key_bytes).map_err(|e| AuthError::SigningMisconfigured(e.to_string()))?;

        let mut config = Self::new(signing_key);

        if let Ok(audience) = std::env::var("AUTH_AUDIENCE") {
            config.audience = audience;
        }
        if let Some(secs) = env_u64("AUTH_ACCESS_TTL_SECS")? {
            config.access_token_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("AUTH_REFRESH_TTL_SECS")? {
            config.refresh_token_ttl = Duration::from_secs(secs);
        }
        if let Ok(secure) = std::env::var("AUTH_COOKIE_SECURE") {
            config.cookie.secure = parse_bool(&secure)
                .ok_or_else(|| AuthError::Config(format!("AUTH_COOKIE_SECURE: {secure}")))?;
        }
        if let Ok(same_site) = std::env::var("AUTH_COOKIE_SAME_SITE") {
            config.cookie.same_site = SameSite::from_str_opt(&same_site)
                .ok_or_else(|| AuthError::Config(format!("AUTH_COOKIE_SAME_SITE: {same_site}")))?;
        }
        if let Ok(pepper) = std::env::var("AUTH_PASSWORD_PEPPER") {
            config.password_pepper = Some(pepper.into_bytes());
        }
        if let Ok(paths) = std::env::var("AUTH_PUBLIC_PATHS") {
            config.public_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants between fields
    pub fn validate(&self) -> AuthResult<()> {
        if self.access_token_ttl.is_zero() {
            return Err(AuthError::Config("access token TTL must be positive".into()));
        }
        if self.refresh_token_ttl > MAX_TOKEN_TTL {
            return Err(AuthError::Config(format!(
                "refresh token TTL must not exceed {} seconds",
                MAX_TOKEN_TTL.as_secs()
            )));
        }
        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err(AuthError::Config(
                "access token TTL must be shorter than refresh token TTL".into(),
            ));
        }
        if self.audience.is_empty() {
            return Err(AuthError::Config("audience must not be empty".into()));
        }
        Ok(())
    }

    /// Hash a random password with this config's cost and pepper and use it
    /// as the decoy for unknown identifiers
    pub fn with_decoy_hash(mut self) -> AuthResult<Self> {
        let secret = ClearTextPassword::new(to_base64(&random_bytes(32)));
        let hash = secret
            .hash(self.password_params, self.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        self.decoy_hash = Some(hash);
        Ok(self)
    }

    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_paths.push(path.into());
        self
    }

    /// Whether `path` equals a public path or lies beneath one
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| {
            let public = public.trim_end_matches('/');
            path == public
                || path
                    .strip_prefix(public)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_token_ttl.as_secs()
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_token_ttl.as_secs()
    }
}

fn env_u64(name: &str) -> AuthResult<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AuthError::Config(format!("{name} must be an integer"))),
        Err(_) => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::with_random_key().unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config();
        assert_eq!(config.access_ttl_secs(), 120);
        assert_eq!(config.refresh_ttl_secs(), 7200);
        assert_eq!(config.access_cookie_name, "access-token");
        assert_eq!(config.refresh_cookie_name, "refresh-token");
        assert!(config.cookie.http_only);
        assert_eq!(config.cookie.same_site, SameSite::Lax);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_above_bound_is_rejected() {
        let mut config = config();
        config.refresh_token_ttl = Duration::from_secs(u64::MAX);
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));

        config.refresh_token_ttl = MAX_TOKEN_TTL;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_is_insecure_cookie() {
        assert!(!AuthConfig::development().unwrap().cookie.secure);
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let mut config = config();
        config.access_token_ttl = Duration::from_secs(7200);
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_public_path_matching() {
        let config = config().with_public_path("/api/auth").with_public_path("/health");

        assert!(config.is_public_path("/health"));
        assert!(config.is_public_path("/api/auth/login"));
        assert!(!config.is_public_path("/api/authors"));
        assert!(!config.is_public_path("/api/articles"));
    }

    #[test]
    fn test_decoy_hash_uses_configured_cost() {
        let mut config = config();
        config.password_params = crate::test_support::FAST;
        let config = config.with_decoy_hash().unwrap();
        let decoy = config.decoy_hash.unwrap();
        assert!(decoy.as_phc_string().contains("m=8,t=1,p=1"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
