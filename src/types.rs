//! Public type definitions for the key directory.
//!
//! These are the records produced by the parser, persisted by the
//! keystore and returned from lookups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fingerprint prefix stripped from search tokens by default.
pub const DEFAULT_FINGERPRINT_PREFIX: &str = "0x";

/// One OpenPGP primary public key and its identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    /// Full key ID, lowercase hex (16 characters for v4 keys)
    pub key_id: String,
    /// Last 8 hex characters of the key ID
    pub key_id_short: String,
    /// Full fingerprint, lowercase hex
    pub fingerprint: String,
    /// Creation time embedded in the primary key packet
    pub created_at: DateTime<Utc>,
    /// Public-key algorithm name (e.g., "RSA", "EdDSA")
    pub algorithm: String,
    /// Key packet version
    pub version: i32,
    /// Whether the key carried a revocation when it was parsed.
    ///
    /// Evaluated once at parse time and stored as-is.
    pub revoked: bool,
    /// The armored key exactly as submitted
    pub public_key: String,
    /// User IDs in the order they appear on the key
    pub identities: Vec<IdentityRecord>,
}

/// A user ID attached to a key, split into its conventional parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Display name
    pub name: String,
    /// Email address, lowercased
    pub email: String,
    /// Free-text comment (empty when absent)
    pub comment: String,
}

/// Outcome of an add-or-replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// No key with this ID existed
    Inserted,
    /// An existing key and its identities were replaced
    Replaced,
}

/// A normalized search, ready to be matched by a backend.
///
/// A record matches when its key ID or short key ID equals `token`, its
/// fingerprint equals `fingerprint`, or any of its identities has an email
/// equal to `token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    /// The lowercased search token
    pub token: String,
    /// The token with the fingerprint prefix removed
    pub fingerprint: String,
}

impl LookupQuery {
    /// Build a query from a raw search token.
    ///
    /// The token is lowercased before `fingerprint_prefix` is stripped, so
    /// the prefix must be lowercase to ever match ([`KeyStore`] lowercases
    /// it once). The prefix only affects the fingerprint candidate; `0x` +
    /// key ID does not match the key ID.
    ///
    /// [`KeyStore`]: crate::KeyStore
    pub fn new(search: &str, fingerprint_prefix: &str) -> Self {
        let token = search.to_lowercase();
        let fingerprint = match token.strip_prefix(fingerprint_prefix) {
            Some(rest) if !fingerprint_prefix.is_empty() => rest.to_string(),
            _ => token.clone(),
        };
        Self { token, fingerprint }
    }

    /// Check a record against all four predicates.
    pub fn matches(&self, record: &KeyRecord) -> bool {
        record.key_id == self.token
            || record.key_id_short == self.token
            || record.fingerprint == self.fingerprint
            || record.identities.iter().any(|id| id.email == self.token)
    }
}

/// How `/pks/lookup` renders a found key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupFormat {
    /// The stored armored text, verbatim
    #[default]
    Armored,
    /// The full record with identities, as JSON
    Json,
}

impl std::str::FromStr for LookupFormat {
    type Err = String;

    /// Parse lookup format from string (case-insensitive).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "armored" | "armor" | "text" => Ok(LookupFormat::Armored),
            "json" => Ok(LookupFormat::Json),
            _ => Err(format!("unknown lookup format: {}", s)),
        }
    }
}

impl std::fmt::Display for LookupFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupFormat::Armored => write!(f, "armored"),
            LookupFormat::Json => write!(f, "json"),
        }
    }
}
