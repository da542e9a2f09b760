//! Shared fixtures. RSA key generation is the slow part of every test, so
//! keypairs are generated once per test binary.

#![allow(dead_code)]

use cardvault_crypto::{KeyMaterial, generate_keypair};
use std::sync::LazyLock;

pub static ALICE: LazyLock<KeyMaterial> = LazyLock::new(|| generate_keypair(2048).unwrap());

pub static BOB: LazyLock<KeyMaterial> = LazyLock::new(|| generate_keypair(2048).unwrap());
