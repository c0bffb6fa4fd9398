//! Persisted client state for Audioteca
//!
//! All state lives in a [`KeyValueStore`] as versioned JSON records. Reads
//! never fail: missing or damaged records come back as defaults. Writes are
//! best effort and report success as a `bool`.

mod bookmarks;
mod checkpoint;
mod error;
mod favorites;
mod recent;
mod record;
mod resume;
mod store;
mod theme;

pub use bookmarks::Bookmarks;
pub use checkpoint::ResumeCheckpointer;
pub use error::{StorageError, StorageResult};
pub use favorites::Favorites;
pub use recent::{RecentBook, RecentBooks, MAX_RECENT_BOOKS};
pub use record::{keys, StateStore, RECORD_VERSION};
pub use resume::{ResumeRecord, ResumeStore};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use theme::ThemeStore;

use std::path::PathBuf;
use std::sync::Arc;

/// Every client-state view over one backend
#[derive(Debug, Clone)]
pub struct ClientState {
    pub resume: ResumeStore,
    pub favorites: Favorites,
    pub recent: RecentBooks,
    pub bookmarks: Bookmarks,
    pub theme: ThemeStore,
    state: StateStore,
}

impl ClientState {
    /// Opens file-backed state in `dir`, creating it if needed
    pub fn open(
        dir: impl Into<PathBuf>,
        max_resume_entries: usize,
        max_recent_books: usize,
    ) -> StorageResult<Self> {
        let store = FileStore::open(dir)?;
        Ok(Self::with_backend(
            Arc::new(store),
            max_resume_entries,
            max_recent_books,
        ))
    }

    /// Volatile state, mostly for tests
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryStore::new()), 50, MAX_RECENT_BOOKS)
    }

    pub fn with_backend(
        backend: Arc<dyn KeyValueStore>,
        max_resume_entries: usize,
        max_recent_books: usize,
    ) -> Self {
        let state = StateStore::new(backend);
        Self {
            resume: ResumeStore::new(state.clone(), max_resume_entries),
            favorites: Favorites::new(state.clone()),
            recent: RecentBooks::new(state.clone(), max_recent_books),
            bookmarks: Bookmarks::new(state.clone()),
            theme: ThemeStore::new(state.clone()),
            state,
        }
    }

    /// Removes every stored key
    pub fn reset(&self) {
        for key in keys::ALL {
            self.state.remove(key);
        }
        log::info!("Client state reset");
    }
}
