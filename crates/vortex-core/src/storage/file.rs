use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::warn;

use super::{KeyValueStore, StorageError};

/// Session file name inside the origin's storage directory
pub const SESSION_FILE: &str = "session.json";

/// Key-value store backed by a single JSON object on disk.
///
/// Every mutation rewrites the file; the file is removed once the last key
/// is gone so a logged-out origin leaves nothing behind. Reads report an
/// unparseable file as `StorageError::Format`; mutations discard it.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store living at `<dir>/session.json`
    pub fn in_dir(dir: PathBuf) -> Self {
        Self::new(dir.join(SESSION_FILE))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Map to mutate. A corrupt file holds nothing worth keeping, so it is
    /// replaced instead of blocking every later write.
    fn load_map_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.load_map() {
            Err(StorageError::Format(e)) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn save_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if map.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load_map()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.load_map_for_update()?;
        map.insert(key.to_string(), value.to_string());
        self.save_map(&map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        match self.load_map() {
            Ok(mut map) => {
                if map.remove(key).is_some() {
                    self.save_map(&map)?;
                }
                Ok(())
            }
            Err(StorageError::Format(e)) => {
                warn!(path = %self.path.display(), error = %e, "Removing corrupt storage file");
                std::fs::remove_file(&self.path)?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
