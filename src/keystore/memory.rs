//! In-memory backend.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::types::{KeyRecord, LookupQuery, Upsert};

use super::KeyBackend;

/// A [`KeyBackend`] that keeps records in a map. Nothing is persisted.
///
/// ```
/// use domain_hq::{KeyStore, MemoryBackend};
///
/// let store = KeyStore::with_default_prefix(MemoryBackend::new());
/// assert_eq!(store.count().unwrap(), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    keys: Mutex<BTreeMap<String, KeyRecord>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn keys(&self) -> Result<MutexGuard<'_, BTreeMap<String, KeyRecord>>, StoreError> {
        self.keys
            .lock()
            .map_err(|_| StoreError::Backend("key map lock poisoned".to_string()))
    }
}

impl KeyBackend for MemoryBackend {
    fn upsert(&self, record: &KeyRecord) -> Result<Upsert, StoreError> {
        let previous = self.keys()?.insert(record.key_id.clone(), record.clone());
        Ok(match previous {
            Some(_) => Upsert::Replaced,
            None => Upsert::Inserted,
        })
    }

    fn find(&self, query: &LookupQuery) -> Result<Vec<KeyRecord>, StoreError> {
        Ok(self
            .keys()?
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    fn remove(&self, key_id: &str) -> Result<bool, StoreError> {
        Ok(self.keys()?.remove(key_id).is_some())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.keys()?.len())
    }
}
