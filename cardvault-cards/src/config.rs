//! Card vault configuration.

use crate::error::{CardError, CardResult};
use cardvault_crypto::CryptoConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_SERVER_KEY: &str = "CARDVAULT_SERVER_KEY";
pub const ENV_KDF_ITERATIONS: &str = "CARDVAULT_KDF_ITERATIONS";
pub const ENV_RSA_BITS: &str = "CARDVAULT_RSA_BITS";
pub const ENV_LOG: &str = "CARDVAULT_LOG";

/// Configuration for the card flows and the hybrid endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Key derivation and key generation parameters.
    pub crypto: CryptoConfig,

    /// PKCS#8 PEM file holding the server's hybrid-transport private key.
    pub server_key_path: PathBuf,

    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            crypto: CryptoConfig::default(),
            server_key_path: PathBuf::from("keys/server_private.pem"),
            log_filter: "info".to_string(),
        }
    }
}

impl VaultConfig {
    /// Defaults overlaid with `CARDVAULT_*` environment variables.
    pub fn from_env() -> CardResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`, then validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CardResult<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_SERVER_KEY) {
            config.server_key_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_KDF_ITERATIONS) {
            config.crypto.kdf.iterations = raw
                .trim()
                .parse()
                .map_err(|e| CardError::Config(format!("{ENV_KDF_ITERATIONS}={raw:?}: {e}")))?;
        }
        if let Some(raw) = lookup(ENV_RSA_BITS) {
            config.crypto.rsa_bits = raw
                .trim()
                .parse()
                .map_err(|e| CardError::Config(format!("{ENV_RSA_BITS}={raw:?}: {e}")))?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CardResult<()> {
        self.crypto
            .validate()
            .map_err(|e| CardError::Config(e.to_string()))?;
        if self.server_key_path.as_os_str().is_empty() {
            return Err(CardError::Config("server_key_path is empty".to_string()));
        }
        Ok(())
    }
}
