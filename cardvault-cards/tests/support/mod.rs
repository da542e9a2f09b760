//! Shared fixtures for the card flow tests.

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardvault_cards::{CardService, CardSubmission, MemoryStore, register};
use cardvault_crypto::{CryptoConfig, DerivedKey, Salt, derive_key, encrypt};
use std::sync::Arc;

pub const PASSWORD: &str = "hunter2";

pub struct Vault {
    pub store: Arc<MemoryStore>,
    pub service: CardService<MemoryStore>,
    pub config: CryptoConfig,
}

impl Vault {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = CryptoConfig::default();
        Self {
            service: CardService::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    /// Registers a user and returns `(user_id, base64 salt)`.
    pub fn register(&self, email: &str, password: &str) -> (i64, String) {
        let receipt = register(self.store.as_ref(), &self.config, "Test User", email, password)
            .unwrap();
        (receipt.user_id, receipt.salt)
    }

    /// The key a client would derive from its password and salt.
    pub fn client_key(&self, password: &str, salt_b64: &str) -> DerivedKey {
        let salt = Salt::from_base64(salt_b64).unwrap();
        derive_key(password, &salt, &self.config.kdf).unwrap()
    }
}

/// A save request carrying `card_json` encrypted under `key`.
pub fn submission(key: &DerivedKey, card_json: &str, password: Option<&str>) -> CardSubmission {
    let encrypted = encrypt(key, card_json.as_bytes()).unwrap();
    CardSubmission {
        payload_encrypted: STANDARD.encode(&encrypted.ciphertext),
        iv: STANDARD.encode(encrypted.iv),
        expiration: "2030-01-01".to_string(),
        password: password.map(str::to_string),
    }
}

pub fn raw_submission(payload: &str, iv: &str, expiration: &str, password: &str) -> CardSubmission {
    CardSubmission {
        payload_encrypted: payload.to_string(),
        iv: iv.to_string(),
        expiration: expiration.to_string(),
        password: Some(password.to_string()),
    }
}
