//! Engine configuration.

use crate::asymmetric::{DEFAULT_RSA_BITS, MIN_RSA_BITS};
use crate::error::{CryptoError, CryptoResult};
use crate::key::KdfParams;
use serde::{Deserialize, Serialize};

/// Tunable cost and size parameters.
///
/// The algorithms themselves (AES-256-CBC, RSA-OAEP-SHA256, RSA-SHA256) are
/// pinned by the persisted formats and are not configurable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoConfig {
    /// Password key derivation parameters.
    #[serde(default)]
    pub kdf: KdfParams,

    /// RSA modulus size for newly issued keypairs.
    #[serde(default = "default_rsa_bits")]
    pub rsa_bits: usize,
}

fn default_rsa_bits() -> usize {
    DEFAULT_RSA_BITS
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            kdf: KdfParams::default(),
            rsa_bits: DEFAULT_RSA_BITS,
        }
    }
}

impl CryptoConfig {
    /// Rejects settings weaker than the engine's floor.
    pub fn validate(&self) -> CryptoResult<()> {
        self.kdf
            .validate()
            .map_err(|e| CryptoError::Configuration(e.to_string()))?;
        if self.rsa_bits < MIN_RSA_BITS {
            return Err(CryptoError::Configuration(format!(
                "rsa_bits {} is below the minimum of {MIN_RSA_BITS}",
                self.rsa_bits
            )));
        }
        Ok(())
    }
}
