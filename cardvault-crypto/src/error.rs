//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors produced by the envelope engine.
///
/// Variants that sit on a trust boundary (`Decryption`, `Unwrap`,
/// `PasswordMismatch`) carry no detail on purpose: a caller must not be
/// able to tell a padding failure from a wrong key.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("key derivation rejected: {0}")]
    KeyDerivation(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed")]
    Decryption,

    #[error("key unwrap failed")]
    Unwrap,

    #[error("incorrect password")]
    PasswordMismatch,

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid IV length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("invalid key encoding: {0}")]
    KeyEncoding(String),

    #[error("malformed encoding: {0}")]
    Encoding(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<base64::DecodeError> for CryptoError {
    fn from(e: base64::DecodeError) -> Self {
        CryptoError::Encoding(format!("base64: {e}"))
    }
}
