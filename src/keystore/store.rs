//! KeyStore implementation.

use tracing::{debug, info, warn};

use crate::error::{LookupError, StoreError};
use crate::types::{KeyRecord, LookupQuery, Upsert, DEFAULT_FINGERPRINT_PREFIX};

use super::KeyBackend;

/// The key directory: add-or-replace and single-result lookup over a
/// pluggable [`KeyBackend`].
///
/// `KeyStore` owns the query semantics (normalization, the four-way
/// match, ambiguity handling). The backend only persists records and
/// evaluates [`LookupQuery`] predicates.
///
/// # Example
///
/// ```no_run
/// use domain_hq::{parse_pub_key, KeyStore, SqliteBackend};
///
/// let store = KeyStore::new(SqliteBackend::open("keys.db").unwrap(), "0x");
///
/// let armored = std::fs::read_to_string("alice.asc").unwrap();
/// let record = parse_pub_key(&armored).unwrap();
/// store.add_or_replace(&record).unwrap();
///
/// let found = store.lookup("alice@example.com").unwrap();
/// assert_eq!(found.key_id, record.key_id);
/// ```
pub struct KeyStore {
    backend: Box<dyn KeyBackend>,
    fingerprint_prefix: String,
}

impl KeyStore {
    /// Create a store over `backend`, stripping `fingerprint_prefix` from
    /// search tokens when matching fingerprints.
    ///
    /// The prefix is lowercased here, so it matches regardless of case.
    pub fn new(backend: impl KeyBackend + 'static, fingerprint_prefix: impl Into<String>) -> Self {
        Self {
            backend: Box::new(backend),
            fingerprint_prefix: fingerprint_prefix.into().to_lowercase(),
        }
    }

    /// Create a store over `backend` using the default `0x` prefix.
    pub fn with_default_prefix(backend: impl KeyBackend + 'static) -> Self {
        Self::new(backend, DEFAULT_FINGERPRINT_PREFIX)
    }

    /// The prefix stripped for fingerprint matching.
    pub fn fingerprint_prefix(&self) -> &str {
        &self.fingerprint_prefix
    }

    /// Insert a key, or replace the stored key with the same key ID.
    ///
    /// Replacement is wholesale: the previous identities are dropped and
    /// the new set is stored in its place.
    pub fn add_or_replace(&self, record: &KeyRecord) -> Result<Upsert, StoreError> {
        let record = normalize(record);
        let outcome = self.backend.upsert(&record)?;

        match outcome {
            Upsert::Inserted => info!(
                key_id = %record.key_id,
                identities = record.identities.len(),
                "key added"
            ),
            Upsert::Replaced => info!(
                key_id = %record.key_id,
                identities = record.identities.len(),
                "key replaced"
            ),
        }

        Ok(outcome)
    }

    /// Resolve a search token to exactly one key.
    ///
    /// The token is compared, case-insensitively, against the key ID, the
    /// short key ID, the fingerprint (after stripping the configured
    /// prefix) and every identity's email. All four predicates are
    /// evaluated together; there is no priority between them.
    ///
    /// # Errors
    /// * [`LookupError::NotFound`] if nothing matches
    /// * [`LookupError::Ambiguous`] if more than one key matches
    /// * [`LookupError::Backend`] on storage failure
    pub fn lookup(&self, search: &str) -> Result<KeyRecord, LookupError> {
        let query = LookupQuery::new(search, &self.fingerprint_prefix);
        let mut matches = self.backend.find(&query)?;

        matches.sort_by(|a, b| a.key_id.cmp(&b.key_id));
        matches.dedup_by(|a, b| a.key_id == b.key_id);

        match matches.len() {
            0 => {
                debug!(search = %query.token, "no key matched");
                Err(LookupError::NotFound)
            }
            1 => Ok(matches.remove(0)),
            n => {
                warn!(search = %query.token, matches = n, "ambiguous key lookup");
                Err(LookupError::Ambiguous(n))
            }
        }
    }

    /// Delete a key and its identities.
    ///
    /// Returns `false` if no key with this ID was stored.
    pub fn remove(&self, key_id: &str) -> Result<bool, StoreError> {
        let removed = self.backend.remove(&key_id.to_lowercase())?;
        if removed {
            info!(key_id = %key_id.to_lowercase(), "key removed");
        }
        Ok(removed)
    }

    /// Count the stored keys.
    pub fn count(&self) -> Result<usize, StoreError> {
        self.backend.count()
    }
}

/// Lowercase every field the directory compares on.
fn normalize(record: &KeyRecord) -> KeyRecord {
    let mut record = record.clone();
    record.key_id = record.key_id.to_lowercase();
    record.key_id_short = record.key_id_short.to_lowercase();
    record.fingerprint = record.fingerprint.to_lowercase();
    for identity in &mut record.identities {
        identity.email = identity.email.to_lowercase();
    }
    record
}
