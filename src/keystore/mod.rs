//! Public key directory storage.
//!
//! [`KeyStore`] implements the directory's semantics: add-or-replace by
//! key ID and lookup of exactly one key by key ID, short key ID,
//! fingerprint or email. Persistence is delegated to a [`KeyBackend`]:
//!
//! - [`SqliteBackend`]: a SQLite database (file or in-memory)
//! - [`MemoryBackend`]: a plain map, for tests and throwaway instances
//!
//! # Basic Usage
//!
//! ```no_run
//! use domain_hq::{parse_pub_key, KeyStore, SqliteBackend};
//!
//! let store = KeyStore::with_default_prefix(SqliteBackend::open("keys.db").unwrap());
//!
//! let armored = std::fs::read_to_string("alice.asc").unwrap();
//! store.add_or_replace(&parse_pub_key(&armored).unwrap()).unwrap();
//!
//! // Any of these resolve to the same key
//! let by_email = store.lookup("Alice@Example.com").unwrap();
//! let by_fpr = store.lookup(&format!("0x{}", by_email.fingerprint)).unwrap();
//! let by_short = store.lookup(&by_email.key_id_short).unwrap();
//! ```

mod memory;
mod schema;
mod sqlite;
mod store;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use store::KeyStore;

use crate::error::StoreError;
use crate::types::{KeyRecord, LookupQuery, Upsert};

/// Persistence operations the directory needs from a storage engine.
///
/// Records handed to a backend are already normalized (lowercase
/// identifiers and emails).
pub trait KeyBackend: Send + Sync {
    /// Store `record`, fully replacing any record with the same key ID
    /// (identities included). The check and the write must be atomic.
    fn upsert(&self, record: &KeyRecord) -> Result<Upsert, StoreError>;

    /// Return every distinct record matching `query`, with identities in
    /// their original order.
    fn find(&self, query: &LookupQuery) -> Result<Vec<KeyRecord>, StoreError>;

    /// Delete the record with `key_id` and its identities.
    fn remove(&self, key_id: &str) -> Result<bool, StoreError>;

    /// Number of stored records.
    fn count(&self) -> Result<usize, StoreError>;
}
