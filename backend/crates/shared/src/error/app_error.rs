//! Application Error - Unified error type for the application
//!
//! Defines [`AppError`], [`AppResult<T>`] and the wire envelope
//! [`ErrorEnvelope`] every HTTP boundary renders errors into.

use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::kind::ErrorKind;

/// Unified application error
///
/// Built with a small builder API. The `message` is user-facing; the
/// `exception` tag is a short diagnostic string (never a stack trace).
///
/// ## Examples
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::new(ErrorKind::Unauthorized, "Unable to authenticate")
///     .with_exception("BadCredentials")
///     .with_path("/login");
/// assert_eq!(err.status_code(), 401);
/// ```
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    exception: Option<Cow<'static, str>>,
    path: Option<String>,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

pub type AppResult<T> = Result<T, AppError>;

/// Structured error body: `{ time, code, path, status, message, exception, data }`
///
/// `code` and `status` both mirror the HTTP status.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub time: DateTime<Utc>,
    pub code: u16,
    pub path: String,
    pub status: u16,
    pub message: String,
    pub exception: String,
    pub data: serde_json::Value,
}

impl AppError {
    // ========================================================================
    // Constructors
    // ========================================================================

    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            exception: None,
            path: None,
            source: None,
        }
    }

    #[inline]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    #[inline]
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InternalServerError, message)
    }

    #[inline]
    pub fn service_unavailable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Short diagnostic tag rendered as `exception`
    #[inline]
    pub fn with_exception(mut self, exception: impl Into<Cow<'static, str>>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Request path the error occurred on
    #[inline]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach the underlying error (kept for logs, never rendered)
    #[inline]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    #[inline]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[inline]
    pub fn is_server_error(&self) -> bool {
        self.kind.is_server_error()
    }

    /// Build the wire envelope, stamped with the current time
    pub fn envelope(&self) -> ErrorEnvelope {
        let status = self.status_code();
        ErrorEnvelope {
            time: Utc::now(),
            code: status,
            path: self.path.clone().unwrap_or_default(),
            status,
            message: self.message.to_string(),
            exception: self
                .exception
                .as_deref()
                .unwrap_or(self.kind.as_str())
                .to_string(),
            data: serde_json::Value::Null,
        }
    }
}

impl fmt::Debug for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("AppError");
        builder.field("kind", &self.kind);
        builder.field("message", &self.message);
        if let Some(exception) = &self.exception {
            builder.field("exception", exception);
        }
        if let Some(path) = &self.path {
            builder.field("path", path);
        }
        if let Some(source) = &self.source {
            builder.field("source", source);
        }
        builder.finish()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}
