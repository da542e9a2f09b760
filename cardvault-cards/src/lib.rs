//! Card flows for CardVault.
//!
//! Registration issues each user a signing keypair whose private half is
//! stored encrypted under their password. Saving a card recovers that key
//! for one request, signs the card's canonical form and stores the
//! signature next to it. Listing and decrypting re-verify every card against
//! the owner's public key, so tampering with stored fields shows up as
//! `signature_valid: false`.
//!
//! [`HybridEndpoint`] is the receive side for senders that wrap a one-time
//! AES key to the server's RSA key.

pub mod cards;
pub mod config;
pub mod error;
pub mod hybrid_endpoint;
pub mod logging;
pub mod registration;
pub mod store;
pub mod types;

pub use cards::CardService;
pub use config::VaultConfig;
pub use error::{CardError, CardResult};
pub use hybrid_endpoint::HybridEndpoint;
pub use logging::init_logging;
pub use registration::register;
pub use store::{CardStore, MemoryStore};
pub use types::{
    CardRecord, CardSubmission, CardSummary, DecryptedCard, NewCard, NewUser,
    RegistrationReceipt, SaveReceipt, UserRecord,
};
