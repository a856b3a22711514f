//! Upstream call guard
//!
//! Bounds every account or attempt store call so a slow dependency surfaces
//! as `UpstreamUnavailable` instead of stalling the request or being mistaken
//! for an authentication failure.

use std::future::Future;
use std::time::Duration;

use crate::error::{AuthError, AuthResult};

pub async fn with_timeout<T, F>(limit: Duration, operation: &'static str, fut: F) -> AuthResult<T>
where
    F: Future<Output = AuthResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                operation,
                timeout_ms = limit.as_millis() as u64,
                "Upstream call timed out"
            );
            Err(AuthError::UpstreamUnavailable(format!("{operation} timed out")))
        }
    }
}
