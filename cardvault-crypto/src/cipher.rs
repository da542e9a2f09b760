//! AES-256-CBC symmetric encryption with PKCS#7 padding.
//!
//! The IV is generated inside [`encrypt`] on every call so a caller can never
//! reuse one. CBC carries no authentication tag: a wrong key, a wrong IV and a
//! corrupted ciphertext all collapse into [`CryptoError::Decryption`].

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, KEY_SIZE, random_bytes};
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the CBC initialization vector (one AES block).
pub const IV_SIZE: usize = 16;

const BLOCK_SIZE: usize = 16;

/// Ciphertext together with the IV it was produced under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub iv: [u8; IV_SIZE],
    pub ciphertext: Vec<u8>,
}

fn check_key(key: &DerivedKey) -> CryptoResult<()> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    Ok(())
}

/// Encrypts `plaintext` under `key` with a fresh random IV.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<EncryptedData> {
    check_key(key)?;

    let iv_bytes = random_bytes(IV_SIZE)?;
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&iv_bytes);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(EncryptedData { iv, ciphertext })
}

/// Decrypts an [`EncryptedData`] produced by [`encrypt`].
pub fn decrypt(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<Vec<u8>> {
    decrypt_parts(key, &data.iv, &data.ciphertext)
}

/// Decrypts a ciphertext whose IV is stored or transported separately.
///
/// Key and IV lengths are checked up front and reported as such; every
/// failure past that point is a bare [`CryptoError::Decryption`].
pub fn decrypt_parts(key: &DerivedKey, iv: &[u8], ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    check_key(key)?;
    if iv.len() != IV_SIZE {
        return Err(CryptoError::InvalidIvLength {
            expected: IV_SIZE,
            actual: iv.len(),
        });
    }
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::Decryption);
    }

    let cipher =
        Aes256CbcDec::new_from_slices(key.as_bytes(), iv).map_err(|_| CryptoError::Decryption)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decryption)
}

/// Encrypts a UTF-8 string.
pub fn encrypt_string(key: &DerivedKey, plaintext: &str) -> CryptoResult<EncryptedData> {
    encrypt(key, plaintext.as_bytes())
}

/// Decrypts to a UTF-8 string. Invalid UTF-8 counts as a decryption failure.
pub fn decrypt_string(key: &DerivedKey, data: &EncryptedData) -> CryptoResult<String> {
    let bytes = decrypt(key, data)?;
    String::from_utf8(bytes).map_err(|_| CryptoError::Decryption)
}
