mod support;

use cardvault_cards::{CardError, CardStore, MemoryStore, register};
use cardvault_crypto::{
    CryptoConfig, Salt, SALT_SIZE, public_key_from_pem, recover_private_key, sign, verify,
};
use support::{PASSWORD, Vault};

#[test]
fn registration_stores_encrypted_private_key() {
    let vault = Vault::new();
    let (user_id, salt_b64) = vault.register("ada@example.com", PASSWORD);

    let user = vault.store.find_user(user_id).unwrap().unwrap();
    let encrypted = user.encrypted_private_key.unwrap();
    let transport = encrypted.to_string();
    assert_eq!(transport.matches(':').count(), 1);
    assert!(!transport.contains("PRIVATE KEY"));

    assert_eq!(user.salt.to_base64(), salt_b64);
    assert_eq!(Salt::from_base64(&salt_b64).unwrap().as_bytes().len(), SALT_SIZE);
    assert!(user.public_key.unwrap().starts_with("-----BEGIN PUBLIC KEY-----"));
}

#[test]
fn stored_keys_form_a_pair() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("grace@example.com", PASSWORD);
    let user = vault.store.find_user(user_id).unwrap().unwrap();

    let private = recover_private_key(
        user.encrypted_private_key.as_ref().unwrap(),
        PASSWORD,
        &user.salt,
        &vault.config.kdf,
    )
    .unwrap();
    let public = public_key_from_pem(user.public_key.as_deref().unwrap()).unwrap();

    let sig = sign(b"pair check", &private).unwrap();
    assert!(verify(b"pair check", &sig, &public));
}

#[test]
fn empty_password_rejected() {
    let store = MemoryStore::new();
    let err = register(&store, &CryptoConfig::default(), "Ada", "ada@example.com", "").unwrap_err();
    assert!(matches!(err, CardError::PasswordRequired));
}

#[test]
fn duplicate_email_rejected() {
    let vault = Vault::new();
    vault.register("dup@example.com", PASSWORD);

    let err = register(vault.store.as_ref(), &vault.config, "Other", "dup@example.com", "pw")
        .unwrap_err();
    assert!(matches!(err, CardError::DuplicateEmail(email) if email == "dup@example.com"));
}

#[test]
fn each_user_gets_distinct_salt_and_keys() {
    let vault = Vault::new();
    let (a, salt_a) = vault.register("a@example.com", PASSWORD);
    let (b, salt_b) = vault.register("b@example.com", PASSWORD);

    assert_ne!(a, b);
    assert_ne!(salt_a, salt_b);
    let ua = vault.store.find_user(a).unwrap().unwrap();
    let ub = vault.store.find_user(b).unwrap().unwrap();
    assert_ne!(ua.public_key, ub.public_key);
}
