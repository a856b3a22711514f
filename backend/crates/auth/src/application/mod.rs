//! Application Layer
//!
//! Use cases and application services.

pub mod authorize;
pub mod config;
pub mod credential_verifier;
pub mod login_attempt_tracker;
pub mod sign_in;
pub mod token_service;
pub mod upstream;

pub use authorize::{AuthorizationOutcome, AuthorizeUseCase};
pub use config::AuthConfig;
pub use credential_verifier::CredentialVerifier;
pub use login_attempt_tracker::LoginAttemptTracker;
pub use sign_in::{SignInOutput, SignInUseCase};
pub use token_service::{AccessClaims, Claims, RefreshClaims, TokenKind, TokenPair, TokenService};
