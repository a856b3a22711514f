//! Token Service
//!
//! Issues access and refresh tokens from a principal snapshot and validates
//! them back into typed claims.
//!
//! Validation order: algorithm and signature, expiration, not-before and
//! audience (all inside the codec), token type, then the subject must still
//! resolve to a usable account.
//! Claim projections only exist on [`AccessClaims`], which can only be
//! obtained through validation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::signed_token::ClaimsCodec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::application::upstream::with_timeout;
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    authorities::Authorities, email::Email, principal::Principal, role::Role,
};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Raw token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub jti: String,
    pub aud: String,
    pub typ: TokenKind,
    /// Comma-joined, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorities: Option<String>,
    /// Access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Claims of a validated access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    claims: Claims,
    authorities: Authorities,
    role: Role,
}

impl AccessClaims {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn authorities(&self) -> &Authorities {
        &self.authorities
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }

    /// Principal as it was when the token was issued
    pub fn principal(&self) -> Principal {
        Principal::new(self.claims.sub.clone(), self.authorities.clone(), self.role)
    }
}

/// Claims of a validated refresh token, with the subject's current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    claims: Claims,
    current: Principal,
}

impl RefreshClaims {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }

    pub fn expires_at(&self) -> i64 {
        self.claims.exp
    }

    /// Principal re-read from the account store during validation
    pub fn current_principal(&self) -> &Principal {
        &self.current
    }
}

/// Freshly issued tokens with their lifetimes in seconds
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_in: u64,
    pub refresh_expires_in: u64,
}

pub struct TokenService<A>
where
    A: AccountRepository,
{
    accounts: Arc<A>,
    config: Arc<AuthConfig>,
    codec: ClaimsCodec,
}

impl<A> TokenService<A>
where
    A: AccountRepository,
{
    pub fn new(accounts: Arc<A>, config: Arc<AuthConfig>) -> Self {
        let codec = ClaimsCodec::new(config.signing_key.clone(), &config.audience);
        Self {
            accounts,
            config,
            codec,
        }
    }

    pub fn issue(&self, principal: &Principal, kind: TokenKind) -> AuthResult<String> {
        self.issue_at(principal, kind, Utc::now())
    }

    /// Sign a token as if issued at `now`. Expiration is `now + ttl(kind)`.
    pub fn issue_at(
        &self,
        principal: &Principal,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> AuthResult<String> {
        let iat = now.timestamp();
        let (ttl, authorities, role) = match kind {
            TokenKind::Access => (
                self.config.access_token_ttl,
                Some(principal.authorities.joined()),
                Some(principal.role.code().to_string()),
            ),
            TokenKind::Refresh => (self.config.refresh_token_ttl, None, None),
        };

        let exp = i64::try_from(ttl.as_secs())
            .ok()
            .and_then(|secs| iat.checked_add(secs))
            .ok_or_else(|| AuthError::Config(format!("token ttl {ttl:?} is out of range")))?;

        let claims = Claims {
            sub: principal.id.clone(),
            iat,
            nbf: iat,
            exp,
            jti: Uuid::new_v4().to_string(),
            aud: self.config.audience.clone(),
            typ: kind,
            authorities,
            role,
        };

        self.codec.encode(&claims).map_err(|e| {
            tracing::error!(error = %e, "Token signing failed");
            AuthError::SigningMisconfigured(e.to_string())
        })
    }

    pub fn issue_pair(&self, principal: &Principal) -> AuthResult<TokenPair> {
        let now = Utc::now();
        Ok(TokenPair {
            access: self.issue_at(principal, TokenKind::Access, now)?,
            refresh: self.issue_at(principal, TokenKind::Refresh, now)?,
            access_expires_in: self.config.access_ttl_secs(),
            refresh_expires_in: self.config.refresh_ttl_secs(),
        })
    }

    pub async fn validate_access(&self, token: &str) -> AuthResult<AccessClaims> {
        let claims = self.verify(token, TokenKind::Access)?;

        let role = claims
            .role
            .as_deref()
            .and_then(Role::from_code)
            .ok_or(AuthError::TokenInvalid)?;
        let authorities = claims
            .authorities
            .as_deref()
            .map(Authorities::parse)
            .ok_or(AuthError::TokenInvalid)?;

        self.resolve_subject(&claims.sub).await?;

        Ok(AccessClaims {
            claims,
            authorities,
            role,
        })
    }

    pub async fn validate_refresh(&self, token: &str) -> AuthResult<RefreshClaims> {
        let claims = self.verify(token, TokenKind::Refresh)?;
        let current = self.resolve_subject(&claims.sub).await?;
        Ok(RefreshClaims { claims, current })
    }

    /// New access token reflecting the subject's current authorities
    pub fn reissue_access(&self, refresh: &RefreshClaims) -> AuthResult<String> {
        self.issue(refresh.current_principal(), TokenKind::Access)
    }

    /// Checks that need no I/O
    fn verify(&self, token: &str, expected: TokenKind) -> AuthResult<Claims> {
        let claims: Claims = self.codec.decode(token)?;

        if claims.typ != expected {
            return Err(AuthError::TokenInvalid);
        }

        Ok(claims)
    }

    /// The subject must name an existing account whose gates all hold
    async fn resolve_subject(&self, subject: &str) -> AuthResult<Principal> {
        let email = Email::new(subject).map_err(|_| AuthError::TokenInvalid)?;

        let account = with_timeout(
            self.config.upstream_timeout,
            "account lookup",
            self.accounts.find_by_email(&email),
        )
        .await?;

        match account {
            Some(account) if account.is_usable() => Ok(account.principal()),
            Some(_) => {
                tracing::debug!("Token subject is no longer usable");
                Err(AuthError::TokenInvalid)
            }
            None => {
                tracing::debug!("Token subject does not resolve");
                Err(AuthError::TokenInvalid)
            }
        }
    }
}
