//! Public key parsing.
//!
//! This module turns a submitted armored key block into a [`KeyRecord`]
//! holding the canonical identifiers the directory stores and searches.

use pgp::composed::SignedPublicKey;
use pgp::types::KeyDetails;

use crate::error::ParseError;
use crate::internal::{
    fingerprint_to_hex, get_algorithm_name, is_key_revoked, key_version, keyid_to_hex,
    parse_armored_keys, short_keyid_to_hex, split_user_id, system_time_to_datetime,
    PUBLIC_KEY_ARMOR_HEADER,
};
use crate::types::{IdentityRecord, KeyRecord};

/// Parse an armored public key block into a key record.
///
/// Exactly one primary key is accepted per submission. Identifiers are
/// lowercased, the email of every User ID is lowercased, and the original
/// text is kept verbatim in [`KeyRecord::public_key`].
///
/// # Errors
/// * [`ParseError::Malformed`] if the text is not a decodable armored key ring
/// * [`ParseError::MultipleKeys`] if it holds more than one primary key
///
/// # Example
/// ```ignore
/// let armored = std::fs::read_to_string("alice.asc")?;
/// let record = parse_pub_key(&armored)?;
/// println!("{} {}", record.key_id, record.fingerprint);
/// ```
pub fn parse_pub_key(armored: &str) -> Result<KeyRecord, ParseError> {
    // The decoder stops at the first armor footer, so a second block would
    // otherwise be silently dropped.
    if armored.matches(PUBLIC_KEY_ARMOR_HEADER).count() > 1 {
        return Err(ParseError::MultipleKeys);
    }

    let mut keys = parse_armored_keys(armored)?;
    if keys.len() > 1 {
        return Err(ParseError::MultipleKeys);
    }
    let public_key = keys
        .pop()
        .ok_or_else(|| ParseError::Malformed("no key found".to_string()))?;

    Ok(extract_key_record(&public_key, armored))
}

/// Build the record for a decoded key.
fn extract_key_record(public_key: &SignedPublicKey, armored: &str) -> KeyRecord {
    let primary = &public_key.primary_key;

    KeyRecord {
        key_id: keyid_to_hex(primary),
        key_id_short: short_keyid_to_hex(primary),
        fingerprint: fingerprint_to_hex(primary),
        created_at: system_time_to_datetime(primary.created_at().into()),
        algorithm: get_algorithm_name(primary),
        version: key_version(primary),
        revoked: is_key_revoked(public_key),
        public_key: armored.to_string(),
        identities: extract_identities(public_key),
    }
}

/// Split every User ID on the key, in source order.
fn extract_identities(public_key: &SignedPublicKey) -> Vec<IdentityRecord> {
    public_key
        .details
        .users
        .iter()
        .map(|u| split_user_id(&String::from_utf8_lossy(u.id.id())))
        .collect()
}
