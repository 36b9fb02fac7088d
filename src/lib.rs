//! # domain-hq
//!
//! A small identity service for one organisational domain. It combines:
//!
//! - **WebFinger discovery**: `acct:user@domain` resources resolve to the
//!   domain's OpenID Connect issuer
//! - **Public key directory**: an HKP-style store of OpenPGP public keys,
//!   uploaded as ASCII armor and looked up by key ID, short key ID,
//!   fingerprint or email
//!
//! OpenPGP parsing uses [rpgp](https://docs.rs/pgp); storage is SQLite via
//! `rusqlite`; the HTTP surface is `axum`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use domain_hq::{parse_pub_key, KeyStore, MemoryBackend};
//!
//! let store = KeyStore::with_default_prefix(MemoryBackend::new());
//!
//! let armored = std::fs::read_to_string("alice.asc").unwrap();
//! let record = parse_pub_key(&armored).unwrap();
//! store.add_or_replace(&record).unwrap();
//!
//! let found = store.lookup("alice@example.com").unwrap();
//! assert_eq!(found.key_id, record.key_id);
//! ```

mod error;
mod internal;
mod parse;
mod types;

pub mod api;
pub mod config;
pub mod keystore;
pub mod webfinger;

// Re-export error types
pub use error::{Error, LookupError, ParseError, ResolveError, Result, StoreError};

// Re-export data types
pub use types::{
    IdentityRecord,
    KeyRecord,
    LookupFormat,
    LookupQuery,
    Upsert,
    DEFAULT_FINGERPRINT_PREFIX,
};

pub use parse::parse_pub_key;

pub use keystore::{KeyBackend, KeyStore, MemoryBackend, SqliteBackend};

pub use webfinger::{resolve, WebFingerResolver, WebFingerResponse};

pub use config::{Config, Overrides};
