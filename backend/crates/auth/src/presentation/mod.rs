//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod context;
pub mod cookies;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

#[cfg(test)]
mod tests;

pub use context::RequestIdentityContext;
pub use cookies::CookieTransport;
pub use handlers::AuthAppState;
pub use middleware::{authorize, require_authority};
pub use router::{auth_router, with_authorization};
