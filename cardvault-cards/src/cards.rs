//! Card save, listing and decryption flows.

use crate::error::{CardError, CardResult};
use crate::store::CardStore;
use crate::types::{
    CardRecord, CardSubmission, CardSummary, DecryptedCard, NewCard, SaveReceipt, UserRecord,
    preview,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardvault_crypto::{
    CryptoConfig, CryptoError, DerivedKey, IV_SIZE, KEY_SIZE, Signable, decrypt_parts,
    normalize_date, recover_private_key, sign_record, truncate_to_seconds, verify_record_pem,
};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Signs cards on save and verifies them on read.
pub struct CardService<S: CardStore + ?Sized> {
    store: Arc<S>,
    crypto: CryptoConfig,
}

impl<S: CardStore + ?Sized> CardService<S> {
    pub fn new(store: Arc<S>, crypto: CryptoConfig) -> Self {
        Self { store, crypto }
    }

    fn user(&self, user_id: i64) -> CardResult<UserRecord> {
        self.store
            .find_user(user_id)?
            .ok_or(CardError::UserNotFound(user_id))
    }

    /// Stores a client-encrypted card and signs it with the owner's key.
    ///
    /// The private key is recovered from `submission.password` for this call
    /// only and dropped before returning.
    pub fn save_card(&self, user_id: i64, submission: &CardSubmission) -> CardResult<SaveReceipt> {
        self.save_card_at(user_id, submission, Utc::now())
    }

    fn save_card_at(
        &self,
        user_id: i64,
        submission: &CardSubmission,
        now: DateTime<Utc>,
    ) -> CardResult<SaveReceipt> {
        let password = submission
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(CardError::PasswordRequired)?;

        let user = self.user(user_id)?;
        let (Some(_), Some(encrypted_private_key)) =
            (user.public_key.as_deref(), user.encrypted_private_key.as_ref())
        else {
            return Err(CardError::MissingKeys);
        };

        let private_key =
            recover_private_key(encrypted_private_key, password, &user.salt, &self.crypto.kdf)
                .map_err(|e| match e {
                    CryptoError::PasswordMismatch => {
                        warn!(user_id, "card save rejected: incorrect password");
                        CardError::IncorrectPassword
                    }
                    other => CardError::Crypto(other),
                })?;

        let payload = STANDARD
            .decode(submission.payload_encrypted.trim())
            .map_err(|e| CardError::InvalidInput(format!("payload_encrypted: {e}")))?;
        let iv = STANDARD
            .decode(submission.iv.trim())
            .map_err(|e| CardError::InvalidInput(format!("iv: {e}")))?;
        if iv.len() != IV_SIZE {
            return Err(CardError::InvalidInput(format!(
                "iv must be {IV_SIZE} bytes, got {}",
                iv.len()
            )));
        }
        let expiration = normalize_date(&submission.expiration)
            .map_err(|e| CardError::InvalidInput(e.to_string()))?;

        let mut card = NewCard {
            user_id,
            payload,
            iv,
            expiration,
            created_at: truncate_to_seconds(now),
            signature: None,
        };
        let signature = sign_record(&card, &private_key)?;
        drop(private_key);
        card.signature = Some(signature.clone());

        let card_id = self.store.insert_card(card)?;
        info!(user_id, card_id, "stored signed card");

        Ok(SaveReceipt {
            card_id,
            signature_preview: preview(&signature),
            signature_len: signature.len(),
        })
    }

    /// Lists a user's stored cards with their signature status, undecrypted.
    pub fn list_raw(&self, user_id: i64) -> CardResult<Vec<CardSummary>> {
        let user = self.user(user_id)?;
        let cards = self.store.cards_for_user(user_id)?;

        Ok(cards
            .into_iter()
            .map(|card| {
                let signature_valid = verify(&card, &user);
                CardSummary {
                    card_id: card.id,
                    payload_preview: preview(&STANDARD.encode(&card.payload)),
                    iv: STANDARD.encode(&card.iv),
                    expiration: card.expiration,
                    signature_preview: card.signature.as_deref().map(preview),
                    signature_valid,
                    created_at: card.created_at,
                }
            })
            .collect())
    }

    /// Decrypts a user's cards with a key the client derived from its
    /// password and salt, and verifies each signature.
    ///
    /// A card that fails to decrypt is returned with an error in `data`
    /// rather than failing the whole call.
    pub fn decrypt_cards(
        &self,
        user_id: i64,
        derived_key_b64: &str,
    ) -> CardResult<Vec<DecryptedCard>> {
        let key = DerivedKey::from_base64(derived_key_b64.trim())
            .map_err(|e| CardError::InvalidInput(format!("derived key: {e}")))?;
        if key.len() != KEY_SIZE {
            return Err(CardError::InvalidInput(format!(
                "derived key must be {KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }

        let user = self.user(user_id)?;
        let cards = self.store.cards_for_user(user_id)?;

        Ok(cards
            .into_iter()
            .map(|card| {
                let data = decrypt_card(&key, &card);
                DecryptedCard {
                    card_id: card.id,
                    data,
                    expiration: card.expiration,
                    signature_valid: verify(&card, &user),
                    signature_preview: card.signature.as_deref().map(preview),
                }
            })
            .collect())
    }
}

fn verify(card: &CardRecord, owner: &UserRecord) -> bool {
    let valid = verify_record_pem(card, owner.public_key.as_deref());
    if !valid {
        debug!(
            card_id = card.id,
            has_signature = card.signature().is_some(),
            "card signature did not verify"
        );
    }
    valid
}

fn decrypt_card(key: &DerivedKey, card: &CardRecord) -> Value {
    let plaintext = match decrypt_parts(key, &card.iv, &card.payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(card_id = card.id, "card decryption failed: {e}");
            return json!({ "error": "decryption failed" });
        }
    };
    match serde_json::from_slice(&plaintext) {
        Ok(value) => value,
        Err(_) => json!({ "error": "invalid JSON after decryption" }),
    }
}
