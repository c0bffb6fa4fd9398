//! Core domain types and error taxonomy shared by the Audioteca crates

pub mod error;
pub mod types;

pub use error::{AppError, ErrorSeverity, RecoveryAction, Result};
pub use types::{
    AudioFormat, Book, BookDuration, BookId, Bookmark, Chapter, Contributor, Cover, Duration,
    PlaybackSpeed, SearchFilters, SearchType, Theme, Timestamp, Validator, Volume,
    AUDIOBOOK_FORMAT, SUPPORTED_SPEEDS,
};
