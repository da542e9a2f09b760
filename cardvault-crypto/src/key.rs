//! Randomness, password salts and PBKDF2 key derivation.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of a per-user password derivation salt in bytes.
pub const SALT_SIZE: usize = 32;

/// Lowest PBKDF2 round count the engine accepts.
pub const MIN_ITERATIONS: u32 = 100_000;

/// Fills a fresh buffer with `n` bytes from the operating system CSPRNG.
///
/// An entropy failure is surfaced as [`CryptoError::Entropy`]; callers treat
/// it as fatal.
pub fn random_bytes(n: usize) -> CryptoResult<Vec<u8>> {
    let mut buf = vec![0u8; n];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| CryptoError::Entropy(e.to_string()))?;
    Ok(buf)
}

/// Per-user salt for password key derivation.
///
/// Generated once at registration and never changed afterwards; the
/// private key can only be recovered with the exact salt it was protected
/// under.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Generates a fresh random salt.
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; SALT_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a salt from a stored byte slice, rejecting anything that is
    /// not exactly [`SALT_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; SALT_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::Encoding(format!(
                "salt must be {SALT_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Decodes a base64 salt as handed out to clients.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD.decode(encoded)?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Salt({})", self.to_base64())
    }
}

/// PBKDF2-HMAC-SHA256 parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Round count; a cost parameter against offline brute force.
    pub iterations: u32,
    /// Output length in bytes. Must be [`KEY_SIZE`], the AES-256 key size.
    pub key_len: usize,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: MIN_ITERATIONS,
            key_len: KEY_SIZE,
        }
    }
}

impl KdfParams {
    pub fn validate(&self) -> CryptoResult<()> {
        if self.iterations < MIN_ITERATIONS {
            return Err(CryptoError::KeyDerivation(format!(
                "iteration count {} is below the minimum of {MIN_ITERATIONS}",
                self.iterations
            )));
        }
        if self.key_len != KEY_SIZE {
            return Err(CryptoError::KeyDerivation(format!(
                "derived key length must be {KEY_SIZE} bytes, got {}",
                self.key_len
            )));
        }
        Ok(())
    }
}

/// Symmetric key material, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey(Vec<u8>);

impl DerivedKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decodes a base64 key handed in by a client that derived it locally.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        Ok(Self(STANDARD.decode(encoded)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DerivedKey([REDACTED; {}])", self.0.len())
    }
}

/// Derives a symmetric key from a password and salt with PBKDF2-HMAC-SHA256.
///
/// Deterministic in `(password, salt, params)`.
pub fn derive_key(password: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    params.validate()?;
    let mut out = vec![0u8; params.key_len];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        params.iterations,
        &mut out,
    );
    Ok(DerivedKey(out))
}

/// Generates a random [`KEY_SIZE`]-byte symmetric key.
pub fn generate_random_key() -> CryptoResult<DerivedKey> {
    random_bytes(KEY_SIZE).map(DerivedKey)
}
