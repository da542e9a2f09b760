//! Record attestation: canonical messages, signing and verification.
//!
//! A record is signed over a canonical string built from the exact values
//! that will be persisted:
//!
//! ```text
//! base64(payload)|base64(iv)|YYYY-MM-DD|<created_at, epoch millis, whole seconds>
//! ```
//!
//! Verification rebuilds the string from the stored values alone, so both
//! sides must go through [`canonicalize`]. The creation timestamp is cut to
//! whole seconds before signing because that is all the storage layer keeps.

use crate::asymmetric;
use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::debug;

/// Delimiter between canonical fields.
pub const FIELD_DELIMITER: char = '|';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Anything that can be attested.
///
/// Implementors build their canonical form from their own persisted fields,
/// usually by calling [`canonicalize`].
pub trait Signable {
    /// The exact message that is signed and later verified.
    fn canonical_form(&self) -> String;

    /// The stored base64 signature, if the record has one.
    fn signature(&self) -> Option<&str>;
}

/// Borrowed view of the fields that take part in a card-style attestation.
#[derive(Clone, Copy, Debug)]
pub struct RecordFields<'a> {
    pub payload: &'a [u8],
    pub iv: &'a [u8],
    pub expiration: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub signature: Option<&'a str>,
}

impl Signable for RecordFields<'_> {
    fn canonical_form(&self) -> String {
        canonicalize(self.payload, self.iv, self.expiration, self.created_at)
    }

    fn signature(&self) -> Option<&str> {
        self.signature
    }
}

/// Parses a date or date-time string down to its calendar date.
///
/// Accepts `YYYY-MM-DD` optionally followed by a `T` or space and any time or
/// zone suffix, which is discarded without conversion.
pub fn normalize_date(raw: &str) -> CryptoResult<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(['T', ' '])
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
        .map_err(|e| CryptoError::InvalidDate(format!("{raw:?}: {e}")))
}

/// Drops sub-second precision.
pub fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(0)
}

/// Builds the canonical message for a record's attested fields.
pub fn canonicalize(
    payload: &[u8],
    iv: &[u8],
    expiration: NaiveDate,
    created_at: DateTime<Utc>,
) -> String {
    format!(
        "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}",
        STANDARD.encode(payload),
        STANDARD.encode(iv),
        expiration.format(DATE_FORMAT),
        truncate_to_seconds(created_at).timestamp_millis()
    )
}

/// Signs a record's canonical form and returns the base64 signature.
///
/// `private` must come from a successful
/// [`crate::custody::recover_private_key`] for the record's owner.
pub fn sign_record<R: Signable + ?Sized>(
    record: &R,
    private: &RsaPrivateKey,
) -> CryptoResult<String> {
    let message = record.canonical_form();
    debug!(%message, "signing record");
    let signature = asymmetric::sign(message.as_bytes(), private)?;
    Ok(STANDARD.encode(signature))
}

/// Verifies a record's stored signature against its owner's public key.
///
/// A missing signature, a missing key or an undecodable signature all
/// verify as `false`.
pub fn verify_record<R: Signable + ?Sized>(record: &R, public: Option<&RsaPublicKey>) -> bool {
    let (Some(signature), Some(public)) = (record.signature(), public) else {
        return false;
    };
    let Ok(signature) = STANDARD.decode(signature) else {
        return false;
    };
    let message = record.canonical_form();
    debug!(%message, "verifying record");
    asymmetric::verify(message.as_bytes(), &signature, public)
}

/// Like [`verify_record`] but takes the owner's public key as stored PEM.
pub fn verify_record_pem<R: Signable + ?Sized>(record: &R, public_pem: Option<&str>) -> bool {
    let public = public_pem.and_then(|pem| asymmetric::public_key_from_pem(pem).ok());
    verify_record(record, public.as_ref())
}
