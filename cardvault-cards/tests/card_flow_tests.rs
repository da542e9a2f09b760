mod support;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardvault_cards::{CardError, CardRecord, CardStore};
use cardvault_crypto::{KEY_SIZE, generate_random_key};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{PASSWORD, Vault, raw_submission, submission};

#[test]
fn save_then_verify_then_tamper() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);

    let receipt = vault
        .service
        .save_card(
            user_id,
            &raw_submission("QQ==", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", PASSWORD),
        )
        .unwrap();
    assert!(receipt.signature_len > 0);
    assert!(receipt.signature_preview.ends_with("..."));

    let listed = vault.service.list_raw(user_id).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].signature_valid);
    assert_eq!(listed[0].iv, "AAAAAAAAAAAAAAAAAAAAAA==");
    assert_eq!(listed[0].expiration.to_string(), "2030-01-01");

    let mut card = vault.store.cards_for_user(user_id).unwrap().remove(0);
    card.iv[0] ^= 0x01;
    vault.store.replace_card(card).unwrap();

    assert!(!vault.service.list_raw(user_id).unwrap()[0].signature_valid);
}

#[test]
fn every_signed_field_is_covered() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);
    vault
        .service
        .save_card(
            user_id,
            &raw_submission("QUJDRA==", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", PASSWORD),
        )
        .unwrap();
    let original = vault.store.cards_for_user(user_id).unwrap().remove(0);

    let mutations: Vec<Box<dyn Fn(&mut CardRecord)>> = vec![
        Box::new(|c: &mut CardRecord| c.payload[0] ^= 0x80),
        Box::new(|c: &mut CardRecord| c.expiration = c.expiration.succ_opt().unwrap()),
        Box::new(|c: &mut CardRecord| c.created_at += chrono::Duration::seconds(1)),
        Box::new(|c: &mut CardRecord| c.signature = None),
    ];
    for mutate in mutations {
        let mut card = original.clone();
        mutate(&mut card);
        vault.store.replace_card(card).unwrap();
        assert!(!vault.service.list_raw(user_id).unwrap()[0].signature_valid);
    }

    vault.store.replace_card(original).unwrap();
    assert!(vault.service.list_raw(user_id).unwrap()[0].signature_valid);
}

#[test]
fn expiration_time_suffix_is_dropped() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);
    vault
        .service
        .save_card(
            user_id,
            &raw_submission(
                "QQ==",
                "AAAAAAAAAAAAAAAAAAAAAA==",
                "2031-06-30T00:00:00.000Z",
                PASSWORD,
            ),
        )
        .unwrap();

    let listed = vault.service.list_raw(user_id).unwrap();
    assert_eq!(listed[0].expiration.to_string(), "2031-06-30");
    assert!(listed[0].signature_valid);
}

#[test]
fn wrong_password_is_reported_as_incorrect_password() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);

    let err = vault
        .service
        .save_card(
            user_id,
            &raw_submission("QQ==", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", "hunter3"),
        )
        .unwrap_err();
    assert!(matches!(err, CardError::IncorrectPassword));
    assert!(vault.store.cards_for_user(user_id).unwrap().is_empty());
}

#[test]
fn missing_password_rejected() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);
    let key = generate_random_key().unwrap();

    let err = vault
        .service
        .save_card(user_id, &submission(&key, "{}", None))
        .unwrap_err();
    assert!(matches!(err, CardError::PasswordRequired));

    let err = vault
        .service
        .save_card(user_id, &submission(&key, "{}", Some("")))
        .unwrap_err();
    assert!(matches!(err, CardError::PasswordRequired));
}

#[test]
fn unknown_user_rejected() {
    let vault = Vault::new();
    let err = vault
        .service
        .save_card(
            42,
            &raw_submission("QQ==", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", PASSWORD),
        )
        .unwrap_err();
    assert!(matches!(err, CardError::UserNotFound(42)));
}

#[test]
fn user_without_keys_must_register_again() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);
    let mut user = vault.store.find_user(user_id).unwrap().unwrap();
    user.encrypted_private_key = None;
    vault.store.replace_user(user).unwrap();

    let err = vault
        .service
        .save_card(
            user_id,
            &raw_submission("QQ==", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", PASSWORD),
        )
        .unwrap_err();
    assert!(matches!(err, CardError::MissingKeys));
}

#[test]
fn malformed_submission_fields_rejected() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);

    let cases = [
        raw_submission("not base64!", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", PASSWORD),
        raw_submission("QQ==", "AAAA", "2030-01-01", PASSWORD),
        raw_submission("QQ==", "AAAAAAAAAAAAAAAAAAAAAA==", "01/01/2030", PASSWORD),
    ];
    for case in &cases {
        let err = vault.service.save_card(user_id, case).unwrap_err();
        assert!(matches!(err, CardError::InvalidInput(_)), "got {err:?}");
    }
}

#[test]
fn cross_user_signature_does_not_verify() {
    let vault = Vault::new();
    let (alice, _) = vault.register("alice@example.com", PASSWORD);
    let (bob, _) = vault.register("bob@example.com", PASSWORD);
    vault
        .service
        .save_card(
            alice,
            &raw_submission("QQ==", "AAAAAAAAAAAAAAAAAAAAAA==", "2030-01-01", PASSWORD),
        )
        .unwrap();

    let alice_user = vault.store.find_user(alice).unwrap().unwrap();
    let mut bob_user = vault.store.find_user(bob).unwrap().unwrap();
    let mut card = vault.store.cards_for_user(alice).unwrap().remove(0);

    // Move Alice's signed card under Bob.
    card.user_id = bob;
    vault.store.replace_card(card).unwrap();
    assert!(vault.service.list_raw(alice).unwrap().is_empty());
    assert!(!vault.service.list_raw(bob).unwrap()[0].signature_valid);

    // Giving Bob Alice's public key makes it verify again.
    bob_user.public_key = alice_user.public_key;
    vault.store.replace_user(bob_user).unwrap();
    assert!(vault.service.list_raw(bob).unwrap()[0].signature_valid);
}

#[test]
fn client_encrypted_card_decrypts_with_derived_key() {
    let vault = Vault::new();
    let (user_id, salt) = vault.register("ada@example.com", PASSWORD);
    let key = vault.client_key(PASSWORD, &salt);

    vault
        .service
        .save_card(
            user_id,
            &submission(&key, r#"{"number":"4111111111111111","holder":"ADA"}"#, Some(PASSWORD)),
        )
        .unwrap();
    vault
        .service
        .save_card(user_id, &submission(&key, "not json", Some(PASSWORD)))
        .unwrap();

    let cards = vault
        .service
        .decrypt_cards(user_id, &STANDARD.encode(key.as_bytes()))
        .unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].data, json!({ "number": "4111111111111111", "holder": "ADA" }));
    assert_eq!(cards[1].data, json!({ "error": "invalid JSON after decryption" }));
    assert!(cards.iter().all(|c| c.signature_valid));
}

#[test]
fn wrong_derived_key_yields_error_entries() {
    let vault = Vault::new();
    let (user_id, salt) = vault.register("ada@example.com", PASSWORD);
    let key = vault.client_key(PASSWORD, &salt);
    vault
        .service
        .save_card(user_id, &submission(&key, r#"{"n":1}"#, Some(PASSWORD)))
        .unwrap();

    let other = vault.client_key("not the password", &salt);
    let cards = vault
        .service
        .decrypt_cards(user_id, &STANDARD.encode(other.as_bytes()))
        .unwrap();

    assert_eq!(cards.len(), 1);
    // A wrong key usually fails the padding check, but can pad correctly by chance.
    assert_ne!(cards[0].data, json!({ "n": 1 }));
    assert!(cards[0].data.get("error").is_some());
    assert!(cards[0].signature_valid);
}

#[test]
fn malformed_derived_key_rejected() {
    let vault = Vault::new();
    let (user_id, _) = vault.register("ada@example.com", PASSWORD);

    let short = STANDARD.encode([0u8; KEY_SIZE - 1]);
    for bad in ["%%%", short.as_str()] {
        let err = vault.service.decrypt_cards(user_id, bad).unwrap_err();
        assert!(matches!(err, CardError::InvalidInput(_)), "got {err:?}");
    }
}

#[test]
fn listing_unknown_user_fails() {
    let vault = Vault::new();
    assert!(matches!(
        vault.service.list_raw(7).unwrap_err(),
        CardError::UserNotFound(7)
    ));
}
