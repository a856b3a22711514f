//! Auth (Authentication / Authorization) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, lockout policy, repository traits
//! - `application/` - Token service, credential verifier, attempt tracker,
//!   sign-in and per-request authorization use cases
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - Cookie transport, middleware, handlers, router
//!
//! ## Features
//! - Stateless HS512 access tokens (2 minutes) and refresh tokens (2 hours)
//! - Access token via `access-token` cookie or `Authorization: Bearer`
//! - Transparent access token reissue from a valid refresh token
//! - Per-route authority guard
//! - Login attempt recording with a consecutive-failure lockout
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Refresh tokens carry no authorities; reissue re-reads the account
//! - Unknown identifiers and wrong passwords produce identical responses
//! - A store timeout is a 503, never an authentication failure

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{ApiError, AuthError, AuthResult};
pub use infra::{InMemoryAuthRepository, PgAuthRepository};
pub use presentation::{
    AuthAppState, RequestIdentityContext, auth_router, require_authority, with_authorization,
};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
