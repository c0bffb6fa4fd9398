//! Key-value backends

use crate::error::{StorageError, StorageResult};
use audioteca_resilience::{with_retry, RetryPolicy};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Durable string storage addressed by key
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes a key; removing a missing key is not an error
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Checks that a key can be used as a file name
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// One JSON file per key inside a directory
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so a reader never sees a partial value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    persist_policy: RetryPolicy,
}

impl FileStore {
    /// Opens (and creates if needed) a store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| StorageError::DirectoryCreationError {
                path: dir.clone(),
                source: e,
            })?;
            log::info!("Created storage directory: {}", dir.display());
        }
        Ok(Self {
            dir,
            persist_policy: RetryPolicy::fixed(3, Duration::from_millis(20)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes content to a temporary file and atomically renames it
    fn write_atomic(&self, path: &Path, content: &str) -> StorageResult<()> {
        let mut temp_file = NamedTempFile::new_in(&self.dir)?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| StorageError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        temp_file.flush()?;
        temp_file
            .persist(path)
            .map_err(|e| StorageError::WriteError {
                path: path.to_path_buf(),
                source: e.error,
            })?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;

        // Renames can fail transiently on some platforms while a reader holds the target
        with_retry(&self.persist_policy, || self.write_atomic(&path, value))?;

        log::debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteError { path, source: e }),
        }
    }
}

/// Volatile store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        validate_key(key)?;
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.values().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_file_store() -> (TempDir, FileStore) {
        let temp_dir = TempDir::new().expect("Should create temp dir");
        let store = FileStore::open(temp_dir.path().join("state")).expect("Should open store");
        (temp_dir, store)
    }

    #[test]
    fn test_file_store_creates_directory() {
        let (_temp, store) = setup_file_store();
        assert!(store.dir().exists());
    }

    #[test]
    fn test_file_store_set_get_remove() {
        let (_temp, store) = setup_file_store();

        assert_eq!(store.get("theme").expect("Should read"), None);
        store.set("theme", "\"sepia\"").expect("Should write");
        assert_eq!(
            store.get("theme").expect("Should read").as_deref(),
            Some("\"sepia\"")
        );
        assert!(store.dir().join("theme.json").exists());

        store.remove("theme").expect("Should remove");
        assert_eq!(store.get("theme").expect("Should read"), None);
        store.remove("theme").expect("Removing twice is fine");
    }

    #[test]
    fn test_file_store_overwrite_leaves_no_temp_files() {
        let (_temp, store) = setup_file_store();
        store.set("favorites", "[1]").expect("Should write");
        store.set("favorites", "[1,2]").expect("Should overwrite");

        let entries: Vec<_> = fs::read_dir(store.dir())
            .expect("Should list")
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            store.get("favorites").expect("Should read").as_deref(),
            Some("[1,2]")
        );
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_temp, store) = setup_file_store();
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("recent_books", "[]").expect("Should write");
        assert_eq!(
            store.get("recent_books").expect("Should read").as_deref(),
            Some("[]")
        );
        store.remove("recent_books").expect("Should remove");
        assert_eq!(store.get("recent_books").expect("Should read"), None);
    }
}
