//! User registration: salt, keypair and password-protected private key.

use crate::error::{CardError, CardResult};
use crate::store::CardStore;
use crate::types::{NewUser, RegistrationReceipt};
use cardvault_crypto::{CryptoConfig, Salt, issue_keypair, protect_private_key};
use tracing::info;

/// Registers a user and persists their key material.
///
/// Only the public key and the encrypted private key reach the store. The
/// returned salt lets a client derive the same symmetric key locally.
pub fn register<S: CardStore + ?Sized>(
    store: &S,
    config: &CryptoConfig,
    name: &str,
    email: &str,
    password: &str,
) -> CardResult<RegistrationReceipt> {
    if password.is_empty() {
        return Err(CardError::PasswordRequired);
    }

    let salt = Salt::generate()?;
    let keys = issue_keypair(config)?;
    let encrypted_private_key = protect_private_key(&keys.private, password, &salt, &config.kdf)?;
    let public_key = keys.public_pem()?;

    let user_id = store.insert_user(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        salt: salt.clone(),
        public_key: public_key.clone(),
        encrypted_private_key,
    })?;
    info!(user_id, "registered user with signing keypair");

    Ok(RegistrationReceipt {
        user_id,
        salt: salt.to_base64(),
        public_key,
    })
}
