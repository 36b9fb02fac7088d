//! Internal helper functions.

use std::io::Cursor;

use pgp::composed::{Deserializable, SignedPublicKey};
use pgp::types::KeyDetails;

use crate::error::ParseError;
use crate::types::IdentityRecord;

/// Armor header line of a public key block.
pub(crate) const PUBLIC_KEY_ARMOR_HEADER: &str = "-----BEGIN PGP PUBLIC KEY BLOCK-----";

/// Decode every public key in an armored key ring.
///
/// Fails on the first key that does not decode, so a ring is never
/// partially accepted.
pub(crate) fn parse_armored_keys(text: &str) -> Result<Vec<SignedPublicKey>, ParseError> {
    let cursor = Cursor::new(text.as_bytes());
    let (keys_iter, _headers) = SignedPublicKey::from_armor_many(cursor)
        .map_err(|e| ParseError::Malformed(e.to_string()))?;

    keys_iter
        .map(|key| key.map_err(|e| ParseError::Malformed(e.to_string())))
        .collect()
}

/// Get the fingerprint as a hex string (lowercase, no spaces).
pub(crate) fn fingerprint_to_hex(key: &impl KeyDetails) -> String {
    hex::encode(key.fingerprint().as_bytes())
}

/// Get the key ID as a hex string (lowercase).
pub(crate) fn keyid_to_hex(key: &impl KeyDetails) -> String {
    hex::encode(key.legacy_key_id().as_ref())
}

/// Get the short key ID: the low 32 bits of the key ID, as lowercase hex.
pub(crate) fn short_keyid_to_hex(key: &impl KeyDetails) -> String {
    let key_id = key.legacy_key_id();
    let bytes: &[u8] = key_id.as_ref();
    hex::encode(&bytes[bytes.len().saturating_sub(4)..])
}

/// Get the key packet version as an integer.
pub(crate) fn key_version(key: &impl KeyDetails) -> i32 {
    i32::from(u8::from(key.version()))
}

/// Convert a SystemTime to chrono DateTime.
pub(crate) fn system_time_to_datetime(st: std::time::SystemTime) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from(st)
}

/// Get a normalized algorithm name for display.
/// Converts rpgp's internal naming to common OpenPGP names.
pub(crate) fn get_algorithm_name(key: &impl KeyDetails) -> String {
    use pgp::crypto::public_key::PublicKeyAlgorithm;

    match key.algorithm() {
        PublicKeyAlgorithm::RSA
        | PublicKeyAlgorithm::RSAEncrypt
        | PublicKeyAlgorithm::RSASign => "RSA".to_string(),
        PublicKeyAlgorithm::EdDSALegacy | PublicKeyAlgorithm::Ed25519 => "EdDSA".to_string(),
        PublicKeyAlgorithm::ECDH => "ECDH".to_string(),
        PublicKeyAlgorithm::ECDSA => "ECDSA".to_string(),
        PublicKeyAlgorithm::X25519 => "X25519".to_string(),
        PublicKeyAlgorithm::X448 => "X448".to_string(),
        PublicKeyAlgorithm::Ed448 => "Ed448".to_string(),
        PublicKeyAlgorithm::DSA => "DSA".to_string(),
        PublicKeyAlgorithm::Elgamal => "Elgamal".to_string(),
        algo => format!("{:?}", algo),
    }
}

/// Split a User ID of the form `Name (Comment) <email>` into its parts.
///
/// Any part may be missing. A bare address (`bob@example.com`) is taken
/// as the email. The email is lowercased.
pub(crate) fn split_user_id(uid: &str) -> IdentityRecord {
    let uid = uid.trim();

    let (rest, email) = match (uid.find('<'), uid.rfind('>')) {
        (Some(start), Some(end)) if start < end => {
            (uid[..start].trim(), uid[start + 1..end].trim().to_string())
        }
        _ if uid.contains('@') && !uid.contains(' ') => ("", uid.to_string()),
        _ => (uid, String::new()),
    };

    let (name, comment) = match (rest.find('('), rest.rfind(')')) {
        (Some(start), Some(end)) if start < end => (
            format!("{} {}", rest[..start].trim(), rest[end + 1..].trim())
                .trim()
                .to_string(),
            rest[start + 1..end].trim().to_string(),
        ),
        _ => (rest.to_string(), String::new()),
    };

    IdentityRecord {
        name,
        email: email.to_lowercase(),
        comment,
    }
}
