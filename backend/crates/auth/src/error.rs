//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! The log line always carries the precise variant. The response body
//! collapses variants that would help enumerate accounts.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::signed_token::CodecError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Message shown for every failure that must not reveal whether the
/// identifier exists
pub const UNABLE_TO_AUTHENTICATE: &str = "Unable to authenticate";

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad signature or malformed token
    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    /// No account for the supplied identifier
    #[error("Account not found")]
    AccountNotFound,

    /// Wrong password
    #[error("Bad credentials")]
    BadCredentials,

    #[error("Credentials have expired")]
    CredentialsExpired,

    /// Account locked by status flag or lockout policy
    #[error("Account is locked")]
    AccountLocked,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Account has expired")]
    AccountExpired,

    /// Protected route reached without an identity
    #[error("Authentication required")]
    Unauthenticated,

    /// Identity lacks the named authority
    #[error("Missing authority: {0}")]
    Forbidden(String),

    /// Login body could not be parsed
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Account or attempt store timed out or failed
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Signing key missing or unusable
    #[error("Signing misconfigured: {0}")]
    SigningMisconfigured(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::TokenInvalid
            | AuthError::TokenExpired
            | AuthError::AccountNotFound
            | AuthError::BadCredentials
            | AuthError::CredentialsExpired
            | AuthError::AccountLocked
            | AuthError::AccountDisabled
            | AuthError::AccountExpired
            | AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::Forbidden(_) => ErrorKind::Forbidden,
            AuthError::MalformedRequest(_) => ErrorKind::BadRequest,
            AuthError::UpstreamUnavailable(_) => ErrorKind::ServiceUnavailable,
            AuthError::SigningMisconfigured(_) | AuthError::Config(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Short diagnostic tag for the response envelope
    ///
    /// `AccountNotFound` reports as `BadCredentials`.
    pub fn exception(&self) -> &'static str {
        match self {
            AuthError::TokenInvalid => "TokenInvalid",
            AuthError::TokenExpired => "TokenExpired",
            AuthError::AccountNotFound | AuthError::BadCredentials => "BadCredentials",
            AuthError::CredentialsExpired => "CredentialsExpired",
            AuthError::AccountLocked => "AccountLocked",
            AuthError::AccountDisabled => "AccountDisabled",
            AuthError::AccountExpired => "AccountExpired",
            AuthError::Unauthenticated => "Unauthenticated",
            AuthError::Forbidden(_) => "AccessDenied",
            AuthError::MalformedRequest(_) => "MalformedRequest",
            AuthError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            AuthError::SigningMisconfigured(_) => "SigningMisconfigured",
            AuthError::Config(_) | AuthError::Internal(_) => "InternalError",
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            AuthError::AccountNotFound | AuthError::BadCredentials => {
                UNABLE_TO_AUTHENTICATE.to_string()
            }
            AuthError::Forbidden(_) => "Access denied".to_string(),
            AuthError::UpstreamUnavailable(_) => "Authentication service unavailable".to_string(),
            AuthError::SigningMisconfigured(_) | AuthError::Config(_) | AuthError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True for failures of the credential or token itself
    pub fn is_authentication_failure(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.public_message()).with_exception(self.exception())
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::UpstreamUnavailable(msg) => {
                tracing::error!(message = %msg, "Auth upstream unavailable");
            }
            AuthError::SigningMisconfigured(msg) | AuthError::Config(msg) => {
                tracing::error!(message = %msg, "Auth misconfigured");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::AccountNotFound => {
                tracing::warn!("Login attempt for unknown account");
            }
            AuthError::BadCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::TokenInvalid => {
                tracing::warn!("Rejected invalid token");
            }
            AuthError::Forbidden(authority) => {
                tracing::warn!(authority = %authority, "Access denied");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// An [`AuthError`] tagged with the request path for the response envelope
#[derive(Debug)]
pub struct ApiError {
    pub error: AuthError,
    pub path: String,
}

impl ApiError {
    pub fn new(error: AuthError, path: impl Into<String>) -> Self {
        Self {
            error,
            path: path.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.error.log();
        self.error
            .to_app_error()
            .with_path(self.path)
            .into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AuthError::UpstreamUnavailable(err.to_string())
            }
            other => AuthError::Internal(format!("Database error: {other}")),
        }
    }
}

impl From<CodecError> for AuthError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::KeyTooShort { .. } | CodecError::Serialize(_) => {
                AuthError::SigningMisconfigured(err.to_string())
            }
            CodecError::Expired => AuthError::TokenExpired,
            CodecError::Malformed
            | CodecError::BadSignature
            | CodecError::UnsupportedAlgorithm
            | CodecError::NotYetValid
            | CodecError::WrongAudience => AuthError::TokenInvalid,
        }
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
