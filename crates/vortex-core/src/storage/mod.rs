//! Key-value persistence backends for session data.
//!
//! This module provides:
//! - `FileStore`: a JSON map file in the cache directory
//! - `KeyringStore`: one OS keychain credential per key
//! - `MemoryStore`: process-local storage for tests and ephemeral runs
//!
//! Backends only move strings around; the session layout lives in
//! `auth::session`.

pub mod file;
pub mod keyring;
pub mod memory;

use thiserror::Error;

pub use self::file::FileStore;
pub use self::keyring::KeyringStore;
pub use self::memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] ::keyring::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable string storage scoped to one backend origin.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
