//! Signed Token Codec
//!
//! HS512 JSON Web Tokens over `jsonwebtoken`, bound to a single audience.
//!
//! ## Security
//! - Only `HS512` is accepted; a header naming any other algorithm is
//!   rejected before the signature is checked
//! - The payload is only deserialized after the signature matches
//! - `exp`, `nbf` and `aud` are mandatory and checked with zero leeway
//! - Keys shorter than 512 bits are rejected at construction time

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Minimum signing key length in bytes (512 bits)
pub const MIN_KEY_LEN: usize = 64;

/// Algorithm written into every header and the only one accepted
pub const ALGORITHM: Algorithm = Algorithm::HS512;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Signing key is too short for HMAC-SHA512
    #[error("Signing key must be at least {min} bytes (got {actual})")]
    KeyTooShort { min: usize, actual: usize },

    /// Token is not a well-formed JWT, or a required claim is missing
    #[error("Malformed token")]
    Malformed,

    /// Signature does not match header and payload
    #[error("Token signature mismatch")]
    BadSignature,

    /// Header names an algorithm other than HS512
    #[error("Unsupported token algorithm")]
    UnsupportedAlgorithm,

    /// `exp` is in the past
    #[error("Token expired")]
    Expired,

    /// `nbf` is in the future
    #[error("Token not yet valid")]
    NotYetValid,

    /// `aud` does not name this service
    #[error("Token audience mismatch")]
    WrongAudience,

    /// Claims could not be serialized
    #[error("Claims serialization failed: {0}")]
    Serialize(String),
}

impl From<jsonwebtoken::errors::Error> for CodecError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => CodecError::BadSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                CodecError::UnsupportedAlgorithm
            }
            ErrorKind::ExpiredSignature => CodecError::Expired,
            ErrorKind::ImmatureSignature => CodecError::NotYetValid,
            ErrorKind::InvalidAudience => CodecError::WrongAudience,
            _ => CodecError::Malformed,
        }
    }
}

/// Symmetric signing key, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: Vec<u8>) -> Result<Self, CodecError> {
        if bytes.len() < MIN_KEY_LEN {
            return Err(CodecError::KeyTooShort {
                min: MIN_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"[REDACTED]").finish()
    }
}

/// Signs and verifies tokens with a single process-wide key
#[derive(Clone)]
pub struct ClaimsCodec {
    key: SigningKey,
    validation: Validation,
}

impl ClaimsCodec {
    pub fn new(key: SigningKey, audience: &str) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "nbf", "aud", "sub"]);

        Self { key, validation }
    }

    /// Serialize and sign a claims payload
    pub fn encode<C: Serialize>(&self, claims: &C) -> Result<String, CodecError> {
        encode(
            &Header::new(ALGORITHM),
            claims,
            &EncodingKey::from_secret(self.key.as_bytes()),
        )
        .map_err(|e| CodecError::Serialize(e.to_string()))
    }

    /// Verify algorithm, signature and the time and audience claims, then
    /// return the payload
    pub fn decode<C: DeserializeOwned>(&self, token: &str) -> Result<C, CodecError> {
        let data = decode::<C>(
            token,
            &DecodingKey::from_secret(self.key.as_bytes()),
            &self.validation,
        )?;
        Ok(data.claims)
    }
}

impl fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("key", &self.key)
            .field("audience", &self.validation.aud)
            .finish()
    }
}
