//! Versioned JSON records on top of a key-value store
//!
//! Every value is stored as `{"version": N, "data": ...}`. A missing record
//! reads as the default. A record that cannot be decoded, or that carries a
//! different version, is logged, removed, and read as the default.
//! Writes never fail the caller: errors are logged and reported as `false`.

use crate::error::{StorageError, StorageResult};
use crate::store::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Current version of every stored record
pub const RECORD_VERSION: u32 = 1;

/// Storage keys
pub mod keys {
    pub const LAST_PLAYED: &str = "last_played";
    pub const PLAYBACK_STATE: &str = "playback_state";
    pub const FAVORITES: &str = "favorites";
    pub const RECENT_BOOKS: &str = "recent_books";
    pub const BOOKMARKS: &str = "bookmarks";
    pub const THEME: &str = "theme";

    pub const ALL: [&str; 6] = [
        LAST_PLAYED,
        PLAYBACK_STATE,
        FAVORITES,
        RECENT_BOOKS,
        BOOKMARKS,
        THEME,
    ];
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Typed access to versioned records
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn KeyValueStore>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Reads a record strictly, reporting corruption as an error
    pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let raw = match self.backend.get(key)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let envelope: Envelope<T> =
            serde_json::from_str(&raw).map_err(|e| StorageError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if envelope.version != RECORD_VERSION {
            return Err(StorageError::Corrupted {
                key: key.to_string(),
                reason: format!(
                    "version {} (expected {})",
                    envelope.version, RECORD_VERSION
                ),
            });
        }

        Ok(Some(envelope.data))
    }

    /// Reads a record, resetting it to the default when it is unreadable
    pub fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load_for_update(key).unwrap_or_default()
    }

    /// Reads a record that the caller is about to rewrite
    ///
    /// Corrupted records are discarded and read as the default like
    /// [`load`](Self::load). A backend read failure returns `None`: the stored
    /// value may still be intact and must not be overwritten.
    pub fn load_for_update<T: DeserializeOwned + Default>(&self, key: &str) -> Option<T> {
        match self.try_load(key) {
            Ok(value) => Some(value.unwrap_or_default()),
            Err(StorageError::Corrupted { key, reason }) => {
                log::warn!("Discarding stored '{}': {}", key, reason);
                if let Err(e) = self.backend.remove(&key) {
                    log::warn!("Failed to remove corrupted '{}': {}", key, e);
                }
                Some(T::default())
            }
            Err(e) => {
                log::warn!("Failed to read '{}': {}", key, e);
                None
            }
        }
    }

    /// Writes a record; returns false if it could not be stored
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match self.try_save(key, value) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to save '{}': {}", key, e);
                false
            }
        }
    }

    pub fn try_save<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(&EnvelopeRef {
            version: RECORD_VERSION,
            data: value,
        })
        .map_err(|e| StorageError::SerializeError {
            key: key.to_string(),
            source: e,
        })?;
        self.backend.set(key, &json)
    }

    /// Deletes a record; returns false if it could not be removed
    pub fn remove(&self, key: &str) -> bool {
        match self.backend.remove(key) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to remove '{}': {}", key, e);
                false
            }
        }
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct UnreadableStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
    }

    impl KeyValueStore for UnreadableStore {
        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::IoError(std::io::Error::other("disk unavailable")));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> StorageResult<()> {
            self.inner.remove(key)
        }
    }

    fn setup() -> (Arc<MemoryStore>, StateStore) {
        let backend = Arc::new(MemoryStore::new());
        let state = StateStore::new(backend.clone());
        (backend, state)
    }

    #[test]
    fn test_missing_record_is_default() {
        let (_backend, state) = setup();
        let favorites: Vec<String> = state.load(keys::FAVORITES);
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_save_wraps_in_envelope() {
        let (backend, state) = setup();
        assert!(state.save(keys::FAVORITES, &vec!["b1".to_string()]));

        let raw = backend
            .get(keys::FAVORITES)
            .expect("Should read")
            .expect("Should exist");
        assert_eq!(raw, r#"{"version":1,"data":["b1"]}"#);

        let back: Vec<String> = state.load(keys::FAVORITES);
        assert_eq!(back, vec!["b1".to_string()]);
    }

    #[test]
    fn test_corrupted_record_is_reset() {
        let (backend, state) = setup();
        backend
            .set(keys::FAVORITES, "{not json")
            .expect("Should write");

        let favorites: Vec<String> = state.load(keys::FAVORITES);
        assert!(favorites.is_empty());
        assert_eq!(backend.get(keys::FAVORITES).expect("Should read"), None);
    }

    #[test]
    fn test_wrong_shape_is_reset() {
        let (backend, state) = setup();
        backend
            .set(keys::FAVORITES, r#"{"version":1,"data":{"a":1}}"#)
            .expect("Should write");

        let favorites: Vec<String> = state.load(keys::FAVORITES);
        assert!(favorites.is_empty());
        assert_eq!(backend.get(keys::FAVORITES).expect("Should read"), None);
    }

    #[test]
    fn test_unversioned_record_is_reset() {
        let (backend, state) = setup();
        backend
            .set(keys::FAVORITES, r#"["b1","b2"]"#)
            .expect("Should write");

        assert!(matches!(
            state.try_load::<Vec<String>>(keys::FAVORITES),
            Err(StorageError::Corrupted { .. })
        ));
        let favorites: Vec<String> = state.load(keys::FAVORITES);
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_future_version_is_reset() {
        let (backend, state) = setup();
        backend
            .set(keys::THEME, r#"{"version":2,"data":"dark"}"#)
            .expect("Should write");

        let theme: Option<String> = state.load(keys::THEME);
        assert!(theme.is_none());
    }

    #[test]
    fn test_load_for_update_refuses_unreadable_backend() {
        let backend = Arc::new(UnreadableStore {
            inner: MemoryStore::new(),
            fail_reads: AtomicBool::new(false),
        });
        let state = StateStore::new(backend.clone());
        assert!(state.save(keys::FAVORITES, &vec!["b1".to_string()]));

        backend.fail_reads.store(true, Ordering::SeqCst);
        assert_eq!(state.load_for_update::<Vec<String>>(keys::FAVORITES), None);
        assert!(state.load::<Vec<String>>(keys::FAVORITES).is_empty());

        backend.fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(
            state.load_for_update::<Vec<String>>(keys::FAVORITES),
            Some(vec!["b1".to_string()])
        );
    }

    #[test]
    fn test_load_for_update_resets_corrupted_record() {
        let (backend, state) = setup();
        backend.set(keys::FAVORITES, "{not json").expect("Should write");

        assert_eq!(
            state.load_for_update::<Vec<String>>(keys::FAVORITES),
            Some(Vec::new())
        );
        assert_eq!(backend.get(keys::FAVORITES).expect("Should read"), None);
    }
}
