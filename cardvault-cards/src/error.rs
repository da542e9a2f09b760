//! Card flow error types.

use cardvault_crypto::CryptoError;
use thiserror::Error;

/// Result type for card flows.
pub type CardResult<T> = Result<T, CardError>;

/// Errors surfaced to callers of the card flows.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("user not found: {0}")]
    UserNotFound(i64),

    #[error("user has no signing keys; register again")]
    MissingKeys,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("a password is required to sign the card")]
    PasswordRequired,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}
