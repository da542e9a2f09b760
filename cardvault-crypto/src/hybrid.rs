//! Hybrid key-transport decryption.
//!
//! A sender generates a random AES-256 key, encrypts its payload with it
//! (AES-256-CBC), wraps the key to the server's RSA public key with OAEP and
//! posts all three parts base64-encoded. The server unwraps the key with its
//! own private key and decrypts the payload.
//!
//! This is an external trust boundary: [`receive_envelope`] never returns an
//! error or panics, and every failure past configuration looks the same to
//! the caller.

use crate::asymmetric::{self, KeyMaterial};
use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::key::generate_random_key;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Message on a successful receive.
pub const SUCCESS_MESSAGE: &str = "hybrid envelope decrypted";

/// Error reported for every envelope that cannot be opened.
pub const ENVELOPE_ERROR: &str = "failed to open hybrid envelope";

/// Error reported when the server key cannot be loaded.
pub const SERVER_KEY_ERROR: &str = "server key unavailable";

/// Wire form of a hybrid envelope, all fields base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridRequest {
    #[serde(alias = "encryptedKey")]
    pub wrapped_key: String,
    pub iv: String,
    #[serde(alias = "encryptedData")]
    pub ciphertext: String,
}

/// Uniform response shape for the hybrid endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HybridResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HybridResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(SUCCESS_MESSAGE.to_string()),
        }
    }

    pub fn failure(error: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            message: None,
        }
    }
}

/// Decoded hybrid envelope. Lives for a single receive call.
#[derive(Clone, Debug)]
pub struct HybridEnvelope {
    pub wrapped_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

impl HybridEnvelope {
    pub fn decode(request: &HybridRequest) -> CryptoResult<Self> {
        Ok(Self {
            wrapped_key: STANDARD.decode(&request.wrapped_key)?,
            iv: STANDARD.decode(&request.iv)?,
            ciphertext: STANDARD.decode(&request.ciphertext)?,
        })
    }

    pub fn encode(&self) -> HybridRequest {
        HybridRequest {
            wrapped_key: STANDARD.encode(&self.wrapped_key),
            iv: STANDARD.encode(&self.iv),
            ciphertext: STANDARD.encode(&self.ciphertext),
        }
    }
}

/// Unwraps the transported key and decrypts the payload.
///
/// The plaintext is returned as JSON when it parses as JSON, otherwise as a
/// JSON string. Invalid UTF-8 sequences are replaced with U+FFFD.
pub fn open_envelope(envelope: &HybridEnvelope, private: &RsaPrivateKey) -> CryptoResult<Value> {
    let key = asymmetric::unwrap_key(&envelope.wrapped_key, private)?;
    let plaintext = cipher::decrypt_parts(&key, &envelope.iv, &envelope.ciphertext)?;
    let text = String::from_utf8_lossy(&plaintext).into_owned();

    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// Sender side: encrypts `plaintext` under a fresh key wrapped to `public`.
pub fn seal_envelope(plaintext: &[u8], public: &RsaPublicKey) -> CryptoResult<HybridEnvelope> {
    let key = generate_random_key()?;
    let encrypted = cipher::encrypt(&key, plaintext)?;
    let wrapped_key = asymmetric::wrap_key(key.as_bytes(), public)?;
    Ok(HybridEnvelope {
        wrapped_key,
        iv: encrypted.iv.to_vec(),
        ciphertext: encrypted.ciphertext,
    })
}

/// Handles one hybrid receive. Never fails; see the module docs.
pub fn receive_envelope(request: &HybridRequest, server_key: &ServerKey) -> HybridResponse {
    let private = match server_key.private_key() {
        Ok(key) => key,
        Err(e) => {
            warn!("hybrid receive aborted: {e}");
            return HybridResponse::failure(SERVER_KEY_ERROR);
        }
    };

    match HybridEnvelope::decode(request).and_then(|envelope| open_envelope(&envelope, private)) {
        Ok(data) => HybridResponse::ok(data),
        Err(e) => {
            debug!("hybrid envelope rejected: {e}");
            HybridResponse::failure(ENVELOPE_ERROR)
        }
    }
}

/// The server's hybrid-transport private key.
///
/// Loaded at most once, from a fixed path, then read-only for the life of
/// the process. Share it behind an `Arc`; concurrent reads need no locking.
#[derive(Debug)]
pub struct ServerKey {
    path: Option<PathBuf>,
    key: OnceLock<RsaPrivateKey>,
}

impl ServerKey {
    /// A key loaded lazily from `path` on first use.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            key: OnceLock::new(),
        }
    }

    /// An already-loaded key.
    pub fn from_key(key: RsaPrivateKey) -> Self {
        Self {
            path: None,
            key: OnceLock::from(key),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the private key, loading it on first call.
    ///
    /// A missing or unreadable key file is a [`CryptoError::Configuration`].
    /// A failed load is not cached, so provisioning the file later recovers.
    pub fn private_key(&self) -> CryptoResult<&RsaPrivateKey> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        let path = self.path.as_deref().ok_or_else(|| {
            CryptoError::Configuration("no server key path configured".to_string())
        })?;
        if !path.exists() {
            return Err(CryptoError::Configuration(format!(
                "server private key not found at {}",
                path.display()
            )));
        }
        let pem = zeroize::Zeroizing::new(fs::read_to_string(path).map_err(|e| {
            CryptoError::Configuration(format!("reading {}: {e}", path.display()))
        })?);
        let key = asymmetric::private_key_from_pem(&pem).map_err(|e| {
            CryptoError::Configuration(format!("{} is not a PKCS#8 key: {e}", path.display()))
        })?;
        debug!("loaded server key from {}", path.display());

        Ok(self.key.get_or_init(|| key))
    }

    /// SPKI PEM of the matching public key, for senders.
    pub fn public_pem(&self) -> CryptoResult<String> {
        asymmetric::public_key_to_pem(&self.private_key()?.to_public_key())
    }
}

/// Generates a server keypair and writes it as PEM files.
///
/// Parent directories are created. On Unix the private key file is created
/// with mode `0600`.
pub fn provision_server_key(
    private_path: &Path,
    public_path: &Path,
    bits: usize,
) -> CryptoResult<KeyMaterial> {
    let keys = asymmetric::generate_keypair(bits)?;
    let private_pem = keys.private_pem()?;
    let public_pem = keys.public_pem()?;

    write_file(private_path, private_pem.as_bytes(), true)?;
    write_file(public_path, public_pem.as_bytes(), false)?;
    debug!(
        "provisioned server keypair at {} / {}",
        private_path.display(),
        public_path.display()
    );
    Ok(keys)
}

fn write_file(path: &Path, contents: &[u8], secret: bool) -> CryptoResult<()> {
    let io_err = |e: std::io::Error| CryptoError::Configuration(format!("{}: {e}", path.display()));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if secret {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = secret;

    let mut file = options.open(path).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)
}
