//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (Base64, random bytes)
//! - HS512 signed-token codec over `jsonwebtoken`
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Cookie and bearer-header handling

pub mod cookie;
pub mod crypto;
pub mod password;
pub mod signed_token;
