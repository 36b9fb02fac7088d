//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pgp::composed::{KeyType, SecretKeyParamsBuilder, SignedKeyDetails, SignedPublicKey, SignedSecretKey};
use pgp::packet::{SignatureConfig, SignatureType, Subpacket, SubpacketData};
use pgp::ser::Serialize;
use pgp::types::{KeyDetails, KeyVersion, Password, Timestamp};
use rand::thread_rng;

/// Fingerprint of `tests/files/example.asc`.
pub const EXAMPLE_FINGERPRINT: &str = "22a37a9a70e3965157e16007fe066b04b44da0d3";
/// Key ID of `tests/files/example.asc`.
pub const EXAMPLE_KEY_ID: &str = "fe066b04b44da0d3";
/// Short key ID of `tests/files/example.asc`.
pub const EXAMPLE_KEY_ID_SHORT: &str = "b44da0d3";
/// Email of the only User ID on `tests/files/example.asc`.
pub const EXAMPLE_EMAIL: &str = "example@example.com";

/// Base path for test files.
pub fn test_files_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("files")
}

/// The armored example key.
pub fn example_key() -> String {
    let path = test_files_dir().join("example.asc");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {:?}: {}", path, e))
}

/// Generate a fresh, unprotected Ed25519 secret key carrying `user_ids`
/// (the first is primary).
pub fn generate_secret_key(user_ids: &[&str]) -> SignedSecretKey {
    let mut rng = thread_rng();

    let mut key_params = SecretKeyParamsBuilder::default();
    key_params
        .key_type(KeyType::Ed25519Legacy)
        .can_certify(true)
        .can_sign(true)
        .primary_user_id(user_ids[0].to_string());

    if user_ids.len() > 1 {
        let additional_uids: Vec<String> = user_ids[1..].iter().map(|s| s.to_string()).collect();
        key_params.user_ids(additional_uids);
    }

    key_params.subkeys(Vec::new());

    key_params
        .build()
        .expect("valid key params")
        .generate(&mut rng)
        .expect("key generation")
}

/// Generate a fresh Ed25519 public key carrying `user_ids`.
pub fn generate_public_key(user_ids: &[&str]) -> SignedPublicKey {
    generate_secret_key(user_ids).to_public_key()
}

/// Generate a public key that carries a key-revocation signature made by
/// its own primary key.
pub fn generate_revoked_public_key(user_ids: &[&str]) -> SignedPublicKey {
    let mut rng = thread_rng();
    let secret_key = generate_secret_key(user_ids);
    let public_key = secret_key.to_public_key();

    let mut config = SignatureConfig::from_key(
        &mut rng,
        &secret_key.primary_key,
        SignatureType::KeyRevocation,
    )
    .expect("signature config");

    config.hashed_subpackets = vec![
        Subpacket::regular(SubpacketData::SignatureCreationTime(Timestamp::now()))
            .expect("creation time subpacket"),
        Subpacket::regular(SubpacketData::IssuerFingerprint(
            secret_key.primary_key.fingerprint(),
        ))
        .expect("issuer fingerprint subpacket"),
    ];

    if secret_key.primary_key.version() <= KeyVersion::V4 {
        config.unhashed_subpackets = vec![Subpacket::regular(SubpacketData::IssuerKeyId(
            secret_key.primary_key.legacy_key_id(),
        ))
        .expect("issuer key id subpacket")];
    }

    let revocation = config
        .sign_key(
            &secret_key.primary_key,
            &Password::from(""),
            &secret_key.primary_key.public_key(),
        )
        .expect("revocation signature");

    let mut revocation_signatures = public_key.details.revocation_signatures.clone();
    revocation_signatures.push(revocation);

    SignedPublicKey {
        primary_key: public_key.primary_key.clone(),
        details: SignedKeyDetails::new(
            revocation_signatures,
            public_key.details.direct_signatures.clone(),
            public_key.details.users.clone(),
            public_key.details.user_attributes.clone(),
        ),
        public_subkeys: public_key.public_subkeys.clone(),
    }
}

/// Generate a key and return it ASCII-armored.
pub fn generate_armored_key(user_ids: &[&str]) -> String {
    armor(&generate_public_key(user_ids))
}

pub fn armor(key: &SignedPublicKey) -> String {
    key.to_armored_string(None.into()).expect("armor key")
}

/// A single armored block whose payload holds several primary keys.
pub fn armored_key_ring(keys: &[SignedPublicKey]) -> String {
    let mut packets = Vec::new();
    for key in keys {
        packets.extend(key.to_bytes().expect("serialize key"));
    }

    let encoded = STANDARD.encode(&packets);
    let mut text = String::from("-----BEGIN PGP PUBLIC KEY BLOCK-----\n\n");
    for line in encoded.as_bytes().chunks(64) {
        text.push_str(std::str::from_utf8(line).expect("base64 is ascii"));
        text.push('\n');
    }
    text.push_str("-----END PGP PUBLIC KEY BLOCK-----\n");
    text
}

/// Percent-encode a value for an `application/x-www-form-urlencoded` body.
pub fn form_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                (b as char).to_string()
            }
            b' ' => "+".to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}
