//! Favorite books

use crate::record::{keys, StateStore};
use audioteca_core::BookId;

/// Ordered favorite list with toggle semantics
#[derive(Debug, Clone)]
pub struct Favorites {
    state: StateStore,
}

impl Favorites {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    /// Favorites in the order they were added
    pub fn list(&self) -> Vec<BookId> {
        self.state.load(keys::FAVORITES)
    }

    pub fn is_favorite(&self, id: &BookId) -> bool {
        self.list().contains(id)
    }

    /// Adds or removes `id`; returns whether it is now a favorite
    ///
    /// Returns `None` and leaves the list untouched when it cannot be read or
    /// written.
    pub fn toggle(&self, id: &BookId) -> Option<bool> {
        let mut list = self.state.load_for_update::<Vec<BookId>>(keys::FAVORITES)?;
        let now_favorite = match list.iter().position(|f| f == id) {
            Some(idx) => {
                list.remove(idx);
                false
            }
            None => {
                list.push(id.clone());
                true
            }
        };
        self.state
            .save(keys::FAVORITES, &list)
            .then_some(now_favorite)
    }
}
