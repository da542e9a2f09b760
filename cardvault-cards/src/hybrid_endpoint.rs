//! Receive side of the hybrid envelope flow.

use crate::config::VaultConfig;
use crate::error::CardResult;
use cardvault_crypto::hybrid::ENVELOPE_ERROR;
use cardvault_crypto::{HybridRequest, HybridResponse, ServerKey, receive_envelope};
use std::sync::Arc;
use tracing::{debug, info};

/// Opens hybrid envelopes with the process-wide server key.
///
/// Cheap to clone; clones share one [`ServerKey`].
#[derive(Clone, Debug)]
pub struct HybridEndpoint {
    server_key: Arc<ServerKey>,
}

impl HybridEndpoint {
    pub fn new(server_key: Arc<ServerKey>) -> Self {
        Self { server_key }
    }

    /// An endpoint whose key is loaded from `config.server_key_path` on
    /// first use.
    pub fn from_config(config: &VaultConfig) -> Self {
        Self::new(Arc::new(ServerKey::from_path(&config.server_key_path)))
    }

    pub fn handle(&self, request: &HybridRequest) -> HybridResponse {
        let response = receive_envelope(request, &self.server_key);
        if response.success {
            info!("hybrid envelope received");
        }
        response
    }

    /// Handles a raw JSON body. A body that does not parse is reported the
    /// same way as an envelope that does not open.
    pub fn handle_json(&self, body: &str) -> HybridResponse {
        match serde_json::from_str::<HybridRequest>(body) {
            Ok(request) => self.handle(&request),
            Err(e) => {
                debug!("rejected hybrid request body: {e}");
                HybridResponse::failure(ENVELOPE_ERROR)
            }
        }
    }

    /// SPKI PEM senders wrap their keys to.
    pub fn server_public_pem(&self) -> CardResult<String> {
        Ok(self.server_key.public_pem()?)
    }
}
