//! Domain types for Audioteca
//!
//! - `book`: books, formats, chapters and contributors
//! - `playback`: speed and volume
//! - `bookmark`: user bookmarks
//! - `search`: catalog search filters
//! - `preferences`: theme
//! - `common`: time types and the `Validator` trait

mod book;
mod bookmark;
mod common;
mod playback;
mod preferences;
mod search;

pub use book::{
    AudioFormat, Book, BookDuration, BookId, Chapter, Contributor, Cover, AUDIOBOOK_FORMAT,
};
pub use bookmark::Bookmark;
pub use common::{Duration, Timestamp, Validator};
pub use playback::{PlaybackSpeed, Volume, SUPPORTED_SPEEDS};
pub use preferences::Theme;
pub use search::{SearchFilters, SearchType};
