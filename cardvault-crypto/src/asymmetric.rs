//! RSA key generation, OAEP key transport and PKCS#1 v1.5 signatures.
//!
//! Keys travel as PEM: SPKI for public keys, PKCS#8 for private keys.

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;
use rand::rngs::OsRng;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

/// Default RSA modulus size in bits.
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Smallest modulus the engine will generate.
pub const MIN_RSA_BITS: usize = 2048;

/// Key transport padding.
pub const WRAP_SCHEME: &str = "RSA-OAEP-SHA256";

/// Record signature scheme.
pub const SIGNATURE_SCHEME: &str = "RSA-SHA256";

/// An RSA keypair.
///
/// Only [`KeyMaterial::public_pem`] may be persisted as-is; the private half
/// must go through [`crate::custody::protect_private_key`] first.
pub struct KeyMaterial {
    pub public: RsaPublicKey,
    pub private: RsaPrivateKey,
}

impl KeyMaterial {
    pub fn from_private(private: RsaPrivateKey) -> Self {
        let public = private.to_public_key();
        Self { public, private }
    }

    /// SPKI PEM encoding of the public key.
    pub fn public_pem(&self) -> CryptoResult<String> {
        public_key_to_pem(&self.public)
    }

    /// PKCS#8 PEM encoding of the private key, wiped on drop.
    pub fn private_pem(&self) -> CryptoResult<Zeroizing<String>> {
        private_key_to_pem(&self.private)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// Generates an RSA keypair of `bits` bits from the OS CSPRNG.
pub fn generate_keypair(bits: usize) -> CryptoResult<KeyMaterial> {
    if bits < MIN_RSA_BITS {
        return Err(CryptoError::KeyGeneration(format!(
            "modulus of {bits} bits is below the minimum of {MIN_RSA_BITS}"
        )));
    }
    let private = RsaPrivateKey::new(&mut OsRng, bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    Ok(KeyMaterial::from_private(private))
}

pub fn public_key_to_pem(key: &RsaPublicKey) -> CryptoResult<String> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

pub fn public_key_from_pem(pem: &str) -> CryptoResult<RsaPublicKey> {
    RsaPublicKey::from_public_key_pem(pem.trim())
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

pub fn private_key_to_pem(key: &RsaPrivateKey) -> CryptoResult<Zeroizing<String>> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

pub fn private_key_from_pem(pem: &str) -> CryptoResult<RsaPrivateKey> {
    RsaPrivateKey::from_pkcs8_pem(pem.trim())
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// Encrypts symmetric key bytes to `public` with RSA-OAEP (SHA-256).
///
/// OAEP is randomized, so the output differs on every call.
pub fn wrap_key(key_bytes: &[u8], public: &RsaPublicKey) -> CryptoResult<Vec<u8>> {
    public
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key_bytes)
        .map_err(|e| CryptoError::Encryption(format!("key wrap failed: {e}")))
}

/// Recovers symmetric key bytes wrapped by [`wrap_key`].
///
/// Every failure is the same [`CryptoError::Unwrap`]. The private-key
/// operation is blinded with fresh randomness on each call.
pub fn unwrap_key(wrapped: &[u8], private: &RsaPrivateKey) -> CryptoResult<DerivedKey> {
    private
        .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), wrapped)
        .map(DerivedKey::from_bytes)
        .map_err(|_| CryptoError::Unwrap)
}

/// Signs `message` with RSASSA-PKCS1-v1_5 over SHA-256.
pub fn sign(message: &[u8], private: &RsaPrivateKey) -> CryptoResult<Vec<u8>> {
    let signing_key = SigningKey::<Sha256>::new(private.clone());
    let signature = signing_key
        .try_sign(message)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(signature.to_bytes().into_vec())
}

/// Checks a signature produced by [`sign`]. Malformed input is `false`.
pub fn verify(message: &[u8], signature: &[u8], public: &RsaPublicKey) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };
    VerifyingKey::<Sha256>::new(public.clone())
        .verify(message, &signature)
        .is_ok()
}
