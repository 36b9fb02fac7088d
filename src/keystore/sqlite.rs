//! SQLite backend.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::types::{IdentityRecord, KeyRecord, LookupQuery, Upsert};

use super::schema::init_schema;
use super::KeyBackend;

/// SQLite-backed key storage.
///
/// Keys live in `gpg_pub_key_stores`, keyed by key ID. Their User IDs
/// live in `gpg_users` and are removed with the key (`ON DELETE CASCADE`).
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so one backend can be shared
/// between request handlers. Calls block; run them off the async
/// executor.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open or create a database at the given path.
    ///
    /// Parent directories must already exist.
    ///
    /// ```no_run
    /// use domain_hq::SqliteBackend;
    ///
    /// let backend = SqliteBackend::open("/var/lib/domain-hq/keys.db").unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Create an in-memory database.
    ///
    /// ```
    /// use domain_hq::SqliteBackend;
    ///
    /// let backend = SqliteBackend::open_in_memory().unwrap();
    /// assert!(backend.path().is_none());
    /// ```
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Get the path to the database file.
    ///
    /// Returns `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> std::result::Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))
    }
}

impl KeyBackend for SqliteBackend {
    fn upsert(&self, record: &KeyRecord) -> std::result::Result<Upsert, StoreError> {
        let mut conn = self.conn()?;

        // IMMEDIATE takes the write lock up front, so the existence check
        // and the write cannot interleave with another writer.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM gpg_pub_key_stores WHERE key_id = ?1)",
            [&record.key_id],
            |row| row.get(0),
        )?;

        if exists {
            tx.execute(
                "UPDATE gpg_pub_key_stores
                 SET key_id_short = ?2, fingerprint = ?3, created_at = ?4, algorithm = ?5,
                     version = ?6, revoked = ?7, public_key = ?8
                 WHERE key_id = ?1",
                params![
                    &record.key_id,
                    &record.key_id_short,
                    &record.fingerprint,
                    record.created_at.timestamp(),
                    &record.algorithm,
                    record.version,
                    record.revoked,
                    &record.public_key,
                ],
            )?;
            tx.execute("DELETE FROM gpg_users WHERE key_id = ?1", [&record.key_id])?;
        } else {
            tx.execute(
                "INSERT INTO gpg_pub_key_stores
                 (key_id, key_id_short, fingerprint, created_at, algorithm, version, revoked, public_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    &record.key_id,
                    &record.key_id_short,
                    &record.fingerprint,
                    record.created_at.timestamp(),
                    &record.algorithm,
                    record.version,
                    record.revoked,
                    &record.public_key,
                ],
            )?;
        }

        for (position, identity) in record.identities.iter().enumerate() {
            tx.execute(
                "INSERT INTO gpg_users (key_id, position, name, email, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    &record.key_id,
                    position as i64,
                    &identity.name,
                    &identity.email,
                    &identity.comment,
                ],
            )?;
        }

        tx.commit()?;

        Ok(if exists {
            Upsert::Replaced
        } else {
            Upsert::Inserted
        })
    }

    fn find(&self, query: &LookupQuery) -> std::result::Result<Vec<KeyRecord>, StoreError> {
        let conn = self.conn()?;

        // LEFT JOIN keeps keys without User IDs reachable by ID or fingerprint.
        let mut stmt = conn.prepare(
            "SELECT DISTINCT k.key_id
             FROM gpg_pub_key_stores k
             LEFT JOIN gpg_users u ON u.key_id = k.key_id
             WHERE k.key_id = ?1
                OR k.key_id_short = ?1
                OR k.fingerprint = ?2
                OR u.email = ?1
             ORDER BY k.key_id",
        )?;

        let key_ids = stmt
            .query_map(params![&query.token, &query.fingerprint], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        key_ids
            .iter()
            .map(|key_id| load_record(&conn, key_id))
            .collect()
    }

    fn remove(&self, key_id: &str) -> std::result::Result<bool, StoreError> {
        let rows = self
            .conn()?
            .execute("DELETE FROM gpg_pub_key_stores WHERE key_id = ?1", [key_id])?;
        Ok(rows > 0)
    }

    fn count(&self) -> std::result::Result<usize, StoreError> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM gpg_pub_key_stores",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Load one key together with its identities.
fn load_record(conn: &Connection, key_id: &str) -> std::result::Result<KeyRecord, StoreError> {
    let mut record = conn.query_row(
        "SELECT key_id, key_id_short, fingerprint, created_at, algorithm, version, revoked, public_key
         FROM gpg_pub_key_stores WHERE key_id = ?1",
        [key_id],
        |row| {
            let created_secs: i64 = row.get(3)?;
            let created_at = DateTime::<Utc>::from_timestamp(created_secs, 0)
                .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, created_secs))?;

            Ok(KeyRecord {
                key_id: row.get(0)?,
                key_id_short: row.get(1)?,
                fingerprint: row.get(2)?,
                created_at,
                algorithm: row.get(4)?,
                version: row.get(5)?,
                revoked: row.get(6)?,
                public_key: row.get(7)?,
                identities: Vec::new(),
            })
        },
    )?;

    let mut stmt = conn.prepare(
        "SELECT name, email, comment FROM gpg_users WHERE key_id = ?1 ORDER BY position",
    )?;
    record.identities = stmt
        .query_map([key_id], |row| {
            Ok(IdentityRecord {
                name: row.get(0)?,
                email: row.get(1)?,
                comment: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(record)
}
