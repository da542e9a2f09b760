//! Envelope cryptography and record attestation for CardVault.
//!
//! # Building blocks
//!
//! - PBKDF2-HMAC-SHA256 key derivation from a password and a per-user salt
//! - AES-256-CBC symmetric encryption with a fresh IV per call
//! - RSA keypairs, RSA-OAEP (SHA-256) key transport and RSA-SHA256 signatures
//!
//! # Services
//!
//! 1. **Key custody** ([`custody`]): issues a user's RSA keypair and keeps the
//!    private half encrypted under a password-derived key. The plaintext
//!    private key exists only for the duration of one signing request.
//!
//! 2. **Attestation** ([`attestation`]): signs a canonical string built from
//!    a record's persisted fields, and verifies it later from storage alone.
//!
//! 3. **Hybrid unwrap** ([`hybrid`]): opens envelopes whose AES key was
//!    wrapped to the server's RSA public key.
//!
//! Every operation is a synchronous computation over in-memory buffers with
//! no shared mutable state; the only process-wide value is the server's
//! hybrid key, which is loaded once and never mutated.

pub mod asymmetric;
pub mod attestation;
mod cipher;
pub mod config;
pub mod custody;
mod error;
pub mod hybrid;
mod key;

pub use asymmetric::{
    KeyMaterial, generate_keypair, private_key_from_pem, private_key_to_pem, public_key_from_pem,
    public_key_to_pem, sign, unwrap_key, verify, wrap_key,
};
pub use attestation::{
    RecordFields, Signable, canonicalize, normalize_date, sign_record, truncate_to_seconds,
    verify_record, verify_record_pem,
};
pub use cipher::{
    EncryptedData, IV_SIZE, decrypt, decrypt_parts, decrypt_string, encrypt, encrypt_string,
};
pub use config::CryptoConfig;
pub use custody::{EncryptedPrivateKey, issue_keypair, protect_private_key, recover_private_key};
pub use error::{CryptoError, CryptoResult};
pub use hybrid::{
    HybridEnvelope, HybridRequest, HybridResponse, ServerKey, open_envelope, provision_server_key,
    receive_envelope, seal_envelope,
};
pub use key::{
    DerivedKey, KEY_SIZE, KdfParams, MIN_ITERATIONS, SALT_SIZE, Salt, derive_key,
    generate_random_key, random_bytes,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
