//! Bookmark domain model

use crate::types::{BookId, Duration, Timestamp, Validator};
use serde::{Deserialize, Serialize};

/// A saved position inside an audiobook
///
/// Bookmarks have no identifier of their own; a bookmark is addressed by its
/// book and position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub book_id: BookId,
    /// 0-based chapter index at the time the bookmark was taken
    pub chapter: usize,
    /// Overall position from the start of the book
    pub position: Duration,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

impl Bookmark {
    /// Creates a new bookmark at the specified position
    pub fn new(book_id: BookId, chapter: usize, position: Duration) -> Self {
        Self {
            book_id,
            chapter,
            position,
            note: None,
            created_at: Timestamp::now(),
        }
    }

    /// Attaches a note to the bookmark
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns true if this bookmark has a non-blank note
    pub fn has_note(&self) -> bool {
        self.note.as_ref().map_or(false, |n| !n.trim().is_empty())
    }

    /// Returns true if this bookmark sits at `position` in `book_id`
    pub fn is_at(&self, book_id: &BookId, position: Duration) -> bool {
        &self.book_id == book_id && self.position == position
    }
}

impl Validator for Bookmark {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.book_id.as_str().trim().is_empty() {
            errors.push("Bookmark must belong to a book".to_string());
        }

        if let Some(note) = &self.note {
            if note.trim().is_empty() {
                errors.push("Bookmark note cannot be empty if set".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
