//! Saved bookmarks

use crate::record::{keys, StateStore};
use audioteca_core::{BookId, Bookmark, Validator};

#[derive(Debug, Clone)]
pub struct Bookmarks {
    state: StateStore,
}

impl Bookmarks {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    pub fn all(&self) -> Vec<Bookmark> {
        self.state.load(keys::BOOKMARKS)
    }

    /// Bookmarks of one book, ordered by position
    pub fn for_book(&self, book_id: &BookId) -> Vec<Bookmark> {
        let mut marks: Vec<Bookmark> = self
            .all()
            .into_iter()
            .filter(|b| &b.book_id == book_id)
            .collect();
        marks.sort_by_key(|b| b.position);
        marks
    }

    /// Stores a bookmark, replacing one at the same book and position
    ///
    /// Invalid bookmarks are rejected with false.
    pub fn add(&self, bookmark: Bookmark) -> bool {
        if let Err(errors) = bookmark.validate() {
            log::warn!("Rejecting bookmark: {}", errors.join("; "));
            return false;
        }

        let Some(mut marks) = self
            .state
            .load_for_update::<Vec<Bookmark>>(keys::BOOKMARKS)
        else {
            return false;
        };
        marks.retain(|b| !b.is_at(&bookmark.book_id, bookmark.position));
        marks.push(bookmark);
        self.state.save(keys::BOOKMARKS, &marks)
    }

    /// Returns true if a bookmark was removed
    pub fn remove(&self, book_id: &BookId, position: audioteca_core::Duration) -> bool {
        let Some(mut marks) = self
            .state
            .load_for_update::<Vec<Bookmark>>(keys::BOOKMARKS)
        else {
            return false;
        };
        let before = marks.len();
        marks.retain(|b| !b.is_at(book_id, position));
        if marks.len() == before {
            return false;
        }
        self.state.save(keys::BOOKMARKS, &marks);
        true
    }
}
