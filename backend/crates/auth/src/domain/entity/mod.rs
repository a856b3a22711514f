//! Entity Module

pub mod account;
pub mod authentication;
pub mod login_attempt;
