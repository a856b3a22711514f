//! Domain Layer
//!
//! Contains entities, value objects, and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{account::Account, authentication::Authentication, login_attempt::LoginAttempt};
pub use repository::{AccountRepository, AuthStore, LoginAttemptRepository};
pub use value_object::{
    account_status::AccountStatus, authorities::Authorities, lockout_policy::LockoutPolicy,
    principal::Principal, role::Role,
};
