//! Recently opened books

use crate::record::{keys, StateStore};
use audioteca_core::{Book, BookId};
use serde::{Deserialize, Serialize};

/// Upper bound on the recent list
pub const MAX_RECENT_BOOKS: usize = 5;

/// Summary kept for a recently opened book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentBook {
    pub id: BookId,
    pub title: String,
    pub authors: Vec<String>,
}

impl From<&Book> for RecentBook {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            title: book.title.clone(),
            authors: book.author_names(),
        }
    }
}

/// Most-recent-first list without duplicates
#[derive(Debug, Clone)]
pub struct RecentBooks {
    state: StateStore,
    max: usize,
}

impl RecentBooks {
    /// `max` is clamped to 1..=5
    pub fn new(state: StateStore, max: usize) -> Self {
        Self {
            state,
            max: max.clamp(1, MAX_RECENT_BOOKS),
        }
    }

    pub fn list(&self) -> Vec<RecentBook> {
        self.state.load(keys::RECENT_BOOKS)
    }

    /// Puts `book` at the front, dropping any older entry for the same id
    pub fn add(&self, book: RecentBook) -> bool {
        let Some(mut list) = self
            .state
            .load_for_update::<Vec<RecentBook>>(keys::RECENT_BOOKS)
        else {
            return false;
        };
        list.retain(|b| b.id != book.id);
        list.insert(0, book);
        list.truncate(self.max);
        self.state.save(keys::RECENT_BOOKS, &list)
    }

    /// Returns true if the book was in the list
    pub fn remove(&self, id: &BookId) -> bool {
        let Some(mut list) = self
            .state
            .load_for_update::<Vec<RecentBook>>(keys::RECENT_BOOKS)
        else {
            return false;
        };
        let before = list.len();
        list.retain(|b| &b.id != id);
        if list.len() == before {
            return false;
        }
        self.state.save(keys::RECENT_BOOKS, &list);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn recent(id: &str) -> RecentBook {
        RecentBook {
            id: BookId::new(id),
            title: format!("Title {}", id),
            authors: vec!["Author".to_string()],
        }
    }

    fn setup() -> RecentBooks {
        RecentBooks::new(StateStore::new(Arc::new(MemoryStore::new())), 5)
    }

    fn ids(books: &RecentBooks) -> Vec<String> {
        books.list().into_iter().map(|b| b.id.to_string()).collect()
    }

    #[test]
    fn test_add_puts_newest_first() {
        let books = setup();
        books.add(recent("a"));
        books.add(recent("b"));
        assert_eq!(ids(&books), vec!["b", "a"]);
    }

    #[test]
    fn test_re_adding_moves_to_front_without_duplicate() {
        let books = setup();
        books.add(recent("a"));
        books.add(recent("b"));
        books.add(recent("a"));
        assert_eq!(ids(&books), vec!["a", "b"]);
    }

    #[test]
    fn test_list_is_bounded() {
        let books = setup();
        for id in ["a", "b", "c", "d", "e", "f", "g"] {
            books.add(recent(id));
        }
        assert_eq!(ids(&books), vec!["g", "f", "e", "d", "c"]);
    }

    #[test]
    fn test_bound_is_clamped() {
        let books = RecentBooks::new(StateStore::new(Arc::new(MemoryStore::new())), 50);
        for i in 0..10 {
            books.add(recent(&i.to_string()));
        }
        assert_eq!(books.list().len(), MAX_RECENT_BOOKS);
    }

    #[test]
    fn test_remove() {
        let books = setup();
        books.add(recent("a"));
        assert!(books.remove(&BookId::new("a")));
        assert!(!books.remove(&BookId::new("a")));
        assert!(books.list().is_empty());
    }

    #[test]
    fn test_from_book() {
        let mut book = Book::new("b1", "El camino");
        book.authors.push(audioteca_core::Contributor::named("Miguel Delibes"));
        let entry = RecentBook::from(&book);
        assert_eq!(entry.title, "El camino");
        assert_eq!(entry.authors, vec!["Miguel Delibes".to_string()]);
    }
}
