//! Theme preference

use crate::record::{keys, StateStore};
use audioteca_core::Theme;

#[derive(Debug, Clone)]
pub struct ThemeStore {
    state: StateStore,
}

impl ThemeStore {
    pub fn new(state: StateStore) -> Self {
        Self { state }
    }

    /// Stored theme, or the default when unset
    pub fn get(&self) -> Theme {
        self.state.load(keys::THEME)
    }

    /// Stored theme, or `fallback` when the listener never picked one
    pub fn get_or(&self, fallback: Theme) -> Theme {
        self.state
            .load::<Option<Theme>>(keys::THEME)
            .unwrap_or(fallback)
    }

    pub fn set(&self, theme: Theme) -> bool {
        self.state.save(keys::THEME, &theme)
    }
}
