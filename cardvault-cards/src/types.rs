//! Records and request/response types for the card flows.

use cardvault_crypto::{EncryptedPrivateKey, Salt, Signable, canonicalize};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

const PREVIEW_CHARS: usize = 50;

/// Shortens a long base64 value for display: first 50 characters and `...`.
pub fn preview(value: &str) -> String {
    let mut out: String = value.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

/// A stored user, as the persistence layer hands it back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub salt: Salt,
    /// SPKI PEM. `None` for accounts created before signing existed.
    pub public_key: Option<String>,
    pub encrypted_private_key: Option<EncryptedPrivateKey>,
    pub registered_on: NaiveDate,
}

/// A user about to be inserted.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub salt: Salt,
    pub public_key: String,
    pub encrypted_private_key: EncryptedPrivateKey,
}

/// A stored card.
///
/// `payload` is the client-encrypted card JSON; the server never sees the
/// key it was encrypted with except on the explicit decrypt path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: i64,
    pub user_id: i64,
    pub payload: Vec<u8>,
    pub iv: Vec<u8>,
    pub expiration: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub signature: Option<String>,
}

impl Signable for CardRecord {
    fn canonical_form(&self) -> String {
        canonicalize(&self.payload, &self.iv, self.expiration, self.created_at)
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

/// A card about to be inserted, with its fields frozen for signing.
#[derive(Clone, Debug)]
pub struct NewCard {
    pub user_id: i64,
    pub payload: Vec<u8>,
    pub iv: Vec<u8>,
    pub expiration: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub signature: Option<String>,
}

impl Signable for NewCard {
    fn canonical_form(&self) -> String {
        canonicalize(&self.payload, &self.iv, self.expiration, self.created_at)
    }

    fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }
}

/// Body of a save-card request.
#[derive(Clone, Debug, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CardSubmission {
    /// Client-encrypted card JSON, base64.
    pub payload_encrypted: String,
    /// IV the client encrypted with, base64 (16 bytes).
    pub iv: String,
    /// Expiration date; a time-of-day suffix is accepted and dropped.
    #[serde(alias = "fecha_expiracion")]
    pub expiration: String,
    /// Needed to recover the user's private key for signing.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub user_id: i64,
    /// Base64 salt, so the client can derive the same key locally.
    pub salt: String,
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub card_id: i64,
    pub signature_preview: String,
    pub signature_len: usize,
}

/// A stored card as shown without decryption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub card_id: i64,
    pub payload_preview: String,
    pub iv: String,
    pub expiration: NaiveDate,
    pub signature_preview: Option<String>,
    pub signature_valid: bool,
    pub created_at: DateTime<Utc>,
}

/// A stored card decrypted with a client-supplied key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptedCard {
    pub card_id: i64,
    /// The decrypted JSON, or `{"error": ...}` when it could not be read.
    pub data: Value,
    pub expiration: NaiveDate,
    pub signature_valid: bool,
    pub signature_preview: Option<String>,
}
