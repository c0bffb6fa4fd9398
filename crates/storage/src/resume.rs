//! Per-book resume positions

use crate::record::{keys, StateStore};
use audioteca_core::{BookId, Duration, Timestamp};
use serde::{Deserialize, Serialize};

/// Where listening stopped in one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub book_id: BookId,
    /// 0-based chapter index
    pub chapter: usize,
    pub position: Duration,
    pub last_played: Timestamp,
}

/// Resume positions keyed by book, bounded to the most recently played
#[derive(Debug, Clone)]
pub struct ResumeStore {
    state: StateStore,
    max_entries: usize,
}

impl ResumeStore {
    pub fn new(state: StateStore, max_entries: usize) -> Self {
        Self {
            state,
            max_entries: max_entries.max(1),
        }
    }

    fn entries(&self) -> Vec<ResumeRecord> {
        self.state.load(keys::PLAYBACK_STATE)
    }

    /// All records, most recently played first
    pub fn all(&self) -> Vec<ResumeRecord> {
        let mut entries = self.entries();
        entries.sort_by(|a, b| b.last_played.cmp(&a.last_played));
        entries
    }

    /// Saves the position for `book_id` and marks it as last played
    pub fn record(&self, book_id: &BookId, chapter: usize, position: Duration) -> bool {
        self.record_at(book_id, chapter, position, Timestamp::now())
    }

    pub fn record_at(
        &self,
        book_id: &BookId,
        chapter: usize,
        position: Duration,
        now: Timestamp,
    ) -> bool {
        let Some(mut entries) = self
            .state
            .load_for_update::<Vec<ResumeRecord>>(keys::PLAYBACK_STATE)
        else {
            return false;
        };
        entries.retain(|r| &r.book_id != book_id);

        // The book just played is never the one evicted
        entries.sort_by(|a, b| b.last_played.cmp(&a.last_played));
        if entries.len() >= self.max_entries {
            for evicted in entries.drain(self.max_entries - 1..) {
                log::debug!("Evicting resume position for {}", evicted.book_id);
            }
        }
        entries.insert(
            0,
            ResumeRecord {
                book_id: book_id.clone(),
                chapter,
                position,
                last_played: now,
            },
        );

        let saved = self.state.save(keys::PLAYBACK_STATE, &entries);
        self.state.save(keys::LAST_PLAYED, book_id) && saved
    }

    pub fn get(&self, book_id: &BookId) -> Option<ResumeRecord> {
        self.entries().into_iter().find(|r| &r.book_id == book_id)
    }

    /// Forgets one book; returns true if it had a record
    pub fn clear(&self, book_id: &BookId) -> bool {
        let Some(mut entries) = self
            .state
            .load_for_update::<Vec<ResumeRecord>>(keys::PLAYBACK_STATE)
        else {
            return false;
        };
        let before = entries.len();
        entries.retain(|r| &r.book_id != book_id);
        if entries.len() == before {
            return false;
        }

        self.state.save(keys::PLAYBACK_STATE, &entries);
        if self.last_played().as_ref() == Some(book_id) {
            self.state.remove(keys::LAST_PLAYED);
        }
        true
    }

    pub fn clear_all(&self) {
        self.state.remove(keys::PLAYBACK_STATE);
        self.state.remove(keys::LAST_PLAYED);
    }

    /// Book most recently written by `record`
    pub fn last_played(&self) -> Option<BookId> {
        self.state.load(keys::LAST_PLAYED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn setup(max: usize) -> ResumeStore {
        ResumeStore::new(StateStore::new(Arc::new(MemoryStore::new())), max)
    }

    fn at(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    #[test]
    fn test_record_and_get() {
        let store = setup(10);
        let id = BookId::new("b1");
        assert!(store.record_at(&id, 2, Duration::from_seconds(900), at(100)));

        let record = store.get(&id).expect("Should have record");
        assert_eq!(record.chapter, 2);
        assert_eq!(record.position, Duration::from_seconds(900));
        assert_eq!(store.last_played(), Some(id));
    }

    #[test]
    fn test_record_overwrites_same_book() {
        let store = setup(10);
        let id = BookId::new("b1");
        store.record_at(&id, 0, Duration::from_seconds(10), at(1));
        store.record_at(&id, 1, Duration::from_seconds(400), at(2));

        assert_eq!(store.all().len(), 1);
        assert_eq!(store.get(&id).map(|r| r.chapter), Some(1));
    }

    #[test]
    fn test_each_book_keeps_its_own_position() {
        let store = setup(10);
        store.record_at(&BookId::new("a"), 0, Duration::from_seconds(10), at(1));
        store.record_at(&BookId::new("b"), 3, Duration::from_seconds(50), at(2));

        assert_eq!(
            store.get(&BookId::new("a")).map(|r| r.position),
            Some(Duration::from_seconds(10))
        );
        assert_eq!(store.last_played(), Some(BookId::new("b")));
    }

    #[test]
    fn test_evicts_least_recently_played() {
        let store = setup(2);
        store.record_at(&BookId::new("a"), 0, Duration::ZERO, at(1));
        store.record_at(&BookId::new("b"), 0, Duration::ZERO, at(2));
        store.record_at(&BookId::new("a"), 0, Duration::ZERO, at(3));
        store.record_at(&BookId::new("c"), 0, Duration::ZERO, at(4));

        let ids: Vec<String> = store
            .all()
            .into_iter()
            .map(|r| r.book_id.to_string())
            .collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_clear() {
        let store = setup(10);
        let id = BookId::new("b1");
        store.record_at(&id, 0, Duration::from_seconds(1), at(1));

        assert!(store.clear(&id));
        assert!(!store.clear(&id));
        assert!(store.get(&id).is_none());
        assert!(store.last_played().is_none());
    }

    #[test]
    fn test_clear_all() {
        let store = setup(10);
        store.record_at(&BookId::new("a"), 0, Duration::ZERO, at(1));
        store.record_at(&BookId::new("b"), 0, Duration::ZERO, at(2));
        store.clear_all();
        assert!(store.all().is_empty());
        assert!(store.last_played().is_none());
    }

    #[test]
    fn test_new_record_survives_timestamp_tie() {
        let store = setup(1);
        store.record_at(&BookId::new("a"), 0, Duration::ZERO, at(5));
        store.record_at(&BookId::new("b"), 0, Duration::ZERO, at(5));

        let ids: Vec<String> = store
            .all()
            .into_iter()
            .map(|r| r.book_id.to_string())
            .collect();
        assert_eq!(ids, vec!["b"]);
        assert_eq!(store.last_played(), Some(BookId::new("b")));
    }

    #[test]
    fn test_new_record_kept_when_clock_steps_back() {
        let store = setup(2);
        store.record_at(&BookId::new("a"), 0, Duration::ZERO, at(100));
        store.record_at(&BookId::new("b"), 0, Duration::ZERO, at(200));
        store.record_at(&BookId::new("c"), 0, Duration::ZERO, at(50));

        assert!(store.get(&BookId::new("c")).is_some());
        assert_eq!(store.last_played(), Some(BookId::new("c")));
    }
}
