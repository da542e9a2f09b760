//! Password-protected custody of a user's RSA private key.
//!
//! The private key is serialized to PKCS#8 PEM, encrypted with AES-256-CBC
//! under a PBKDF2 key derived from the user's password and salt, and stored
//! as `base64(iv):base64(ciphertext)`. Nothing here persists anything.

use crate::asymmetric::{self, KeyMaterial};
use crate::cipher::{self, EncryptedData, IV_SIZE};
use crate::config::CryptoConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, Salt, derive_key};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use zeroize::Zeroizing;

/// Separator between the IV and ciphertext in the transport form.
/// The standard base64 alphabet never contains it.
pub const TRANSPORT_SEPARATOR: char = ':';

/// A private key encrypted under a password-derived key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EncryptedPrivateKey {
    inner: EncryptedData,
}

impl EncryptedPrivateKey {
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.inner.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.inner.ciphertext
    }
}

impl fmt::Display for EncryptedPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{TRANSPORT_SEPARATOR}{}",
            STANDARD.encode(self.inner.iv),
            STANDARD.encode(&self.inner.ciphertext)
        )
    }
}

impl FromStr for EncryptedPrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> CryptoResult<Self> {
        let (iv_b64, ct_b64) = s.split_once(TRANSPORT_SEPARATOR).ok_or_else(|| {
            CryptoError::Encoding("encrypted private key is missing the ':' separator".to_string())
        })?;
        if ct_b64.contains(TRANSPORT_SEPARATOR) {
            return Err(CryptoError::Encoding(
                "encrypted private key has more than one ':' separator".to_string(),
            ));
        }

        let iv_bytes = STANDARD.decode(iv_b64)?;
        let iv: [u8; IV_SIZE] =
            iv_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidIvLength {
                    expected: IV_SIZE,
                    actual: iv_bytes.len(),
                })?;
        let ciphertext = STANDARD.decode(ct_b64)?;

        Ok(Self {
            inner: EncryptedData { iv, ciphertext },
        })
    }
}

impl From<EncryptedPrivateKey> for String {
    fn from(key: EncryptedPrivateKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for EncryptedPrivateKey {
    type Error = CryptoError;

    fn try_from(s: String) -> CryptoResult<Self> {
        s.parse()
    }
}

/// Generates a fresh keypair for a new user.
pub fn issue_keypair(config: &CryptoConfig) -> CryptoResult<KeyMaterial> {
    asymmetric::generate_keypair(config.rsa_bits)
}

/// Encrypts `private` under a key derived from `password` and `salt`.
///
/// The salt is the one recorded for the user at registration; it is never
/// generated here.
pub fn protect_private_key(
    private: &RsaPrivateKey,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<EncryptedPrivateKey> {
    let derived = derive_key(password, salt, params)?;
    let pem = asymmetric::private_key_to_pem(private)?;
    let inner = cipher::encrypt(&derived, pem.as_bytes())?;
    Ok(EncryptedPrivateKey { inner })
}

/// Recovers the private key protected by [`protect_private_key`].
///
/// A wrong password or salt fails as [`CryptoError::PasswordMismatch`],
/// whether it trips the padding check or decrypts to something that is not
/// a valid key. Rejected KDF parameters and key or IV length errors are
/// returned as they are.
pub fn recover_private_key(
    encrypted: &EncryptedPrivateKey,
    password: &str,
    salt: &Salt,
    params: &KdfParams,
) -> CryptoResult<RsaPrivateKey> {
    let derived = derive_key(password, salt, params)?;

    let plaintext = cipher::decrypt(&derived, &encrypted.inner).map_err(|e| match e {
        CryptoError::Decryption => {
            debug!("private key decryption failed: {e}");
            CryptoError::PasswordMismatch
        }
        other => other,
    })?;
    let pem = Zeroizing::new(String::from_utf8(plaintext).map_err(|_| {
        debug!("decrypted private key is not UTF-8");
        CryptoError::PasswordMismatch
    })?);

    asymmetric::private_key_from_pem(&pem).map_err(|_| {
        debug!("decrypted private key is not a PKCS#8 document");
        CryptoError::PasswordMismatch
    })
}
