//! Value Object Module

pub mod account_status;
pub mod authorities;
pub mod email;
pub mod lockout_policy;
pub mod principal;
pub mod role;
