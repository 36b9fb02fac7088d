//! Error types for the key directory and WebFinger resolver.
//!
//! Each component has its own small error enum so that callers can map
//! failures to responses precisely. [`Error`] wraps all of them for code
//! that only needs to propagate.

use thiserror::Error;

/// Failure to turn submitted armored text into a [`KeyRecord`](crate::KeyRecord).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The text could not be decoded as an armored public key ring
    #[error("Malformed key: {0}")]
    Malformed(String),

    /// The ring decoded to more than one primary key
    #[error("more than one key found")]
    MultipleKeys,
}

/// Failure reported by a storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// Failure to resolve a search token to exactly one key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No stored key matched the token
    #[error("key not found")]
    NotFound,

    /// More than one distinct key matched the token
    #[error("more than one key found ({0} matches)")]
    Ambiguous(usize),

    /// Underlying storage failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for LookupError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Backend(msg) => LookupError::Backend(msg),
        }
    }
}

/// Failure to resolve a WebFinger resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The resource is not of the form `acct:<account>`
    #[error("invalid 'resource' parameter")]
    InvalidFormat,

    /// The account does not belong to the authoritative domain
    #[error("domain not allowed")]
    DomainNotAllowed,
}

/// The crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Key parsing failed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Storage failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Key lookup failed
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// WebFinger resolution failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for crate operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Store(e.into())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
