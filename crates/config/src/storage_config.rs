//! Client state configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Books whose resume position is kept; older ones are forgotten
    pub max_resume_entries: usize,

    /// Length of the recently opened list (at most 5)
    pub max_recent_books: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_resume_entries: 50,
            max_recent_books: 5,
        }
    }
}

impl ConfigSection for StorageConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(
                self.max_resume_entries,
                1,
                10_000,
                "storage.max_resume_entries",
            ),
            Validator::in_range(self.max_recent_books, 1, 5, "storage.max_recent_books"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.max_resume_entries = other.max_resume_entries;
        self.max_recent_books = other.max_recent_books;
    }

    fn section_name(&self) -> &'static str {
        "storage"
    }
}
