//! Book, format and chapter domain models

use crate::types::{Duration, Validator};
use serde::{Deserialize, Serialize};

/// Format tag of the playable audiobook rendition in a catalog entry
pub const AUDIOBOOK_FORMAT: &str = "abook";

/// Catalog identifier for a book
///
/// The catalog keys books by opaque strings, so this is a thin newtype
/// rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    /// Creates a BookId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An author or narrator credit
///
/// The catalog sends either a bare name or a profile record. The shape is
/// decided once when the entry is ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Contributor {
    /// Credit carrying only a display name
    Named { name: String },
    /// Credit linked to a contributor profile
    Profile {
        id: Option<String>,
        name: String,
        deep_link: Option<String>,
    },
}

impl Contributor {
    /// Creates a name-only credit
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named { name: name.into() }
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        match self {
            Self::Named { name } | Self::Profile { name, .. } => name,
        }
    }
}

impl std::fmt::Display for Contributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Cover image reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cover {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A chapter within an audio format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based chapter number as published
    pub number: u32,
    pub title: Option<String>,
    pub duration: Duration,
}

impl Chapter {
    /// Creates a new chapter
    pub fn new(number: u32, title: Option<String>, duration: Duration) -> Self {
        Self {
            number,
            title,
            duration,
        }
    }

    /// Title for display, falling back to "Chapter N" when blank
    pub fn display_title(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Chapter {}", self.number),
        }
    }
}

/// A rendition of a book (the audiobook, an ebook, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Format tag, `"abook"` for the playable audiobook
    pub kind: String,
    pub total_duration: Duration,
    pub chapters: Vec<Chapter>,
    pub cover: Option<Cover>,
}

impl AudioFormat {
    /// Creates an audiobook format from its chapters, deriving the total
    pub fn from_chapters(chapters: Vec<Chapter>) -> Self {
        let total_duration = chapters.iter().map(|c| c.duration).sum();
        Self {
            kind: AUDIOBOOK_FORMAT.to_string(),
            total_duration,
            chapters,
            cover: None,
        }
    }

    /// Returns true if this is the playable audiobook rendition
    pub fn is_audiobook(&self) -> bool {
        self.kind == AUDIOBOOK_FORMAT
    }

    /// Returns true if chapter navigation is available
    pub fn has_chapters(&self) -> bool {
        !self.chapters.is_empty()
    }

    /// Returns the number of chapters
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Chapter durations in order
    pub fn chapter_durations(&self) -> Vec<Duration> {
        self.chapters.iter().map(|c| c.duration).collect()
    }

    /// Sum of chapter durations
    pub fn chapters_total(&self) -> Duration {
        self.chapters.iter().map(|c| c.duration).sum()
    }
}

impl Validator for AudioFormat {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.kind.trim().is_empty() {
            errors.push("Format type cannot be empty".to_string());
        }

        if self.has_chapters() && self.chapters_total() != self.total_duration {
            errors.push(format!(
                "Chapter durations sum to {}ms but total duration is {}ms",
                self.chapters_total().as_millis(),
                self.total_duration.as_millis()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Display duration as published by the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl std::fmt::Display for BookDuration {
    /// Formats as "5h 3m", "12m 4s", "0s"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if self.hours > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.minutes > 0 || self.hours > 0 {
            parts.push(format!("{}m", self.minutes));
        }
        if self.seconds > 0 || parts.is_empty() {
            parts.push(format!("{}s", self.seconds));
        }
        f.write_str(&parts.join(" "))
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub authors: Vec<Contributor>,
    pub narrators: Vec<Contributor>,
    pub genres: Vec<String>,
    pub description: String,
    pub language: String,
    /// Identifier used to resolve the playable media URL
    pub download_id: String,
    pub formats: Vec<AudioFormat>,
    pub duration: BookDuration,
    pub cover: Cover,
    pub original_title: Option<String>,
    pub is_abridged: bool,
}

impl Book {
    /// Creates a book with required fields; the download id defaults to the book id
    pub fn new(id: impl Into<BookId>, title: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            download_id: id.as_str().to_string(),
            id,
            title: title.into(),
            authors: Vec::new(),
            narrators: Vec::new(),
            genres: Vec::new(),
            description: String::new(),
            language: String::new(),
            formats: Vec::new(),
            duration: BookDuration::default(),
            cover: Cover::default(),
            original_title: None,
            is_abridged: false,
        }
    }

    /// Returns the playable audiobook rendition, if the entry has one
    pub fn audiobook_format(&self) -> Option<&AudioFormat> {
        self.formats.iter().find(|f| f.is_audiobook())
    }

    /// Author names joined for display
    pub fn author_names(&self) -> Vec<String> {
        self.authors.iter().map(|a| a.name().to_string()).collect()
    }

    /// Narrator names joined for display
    pub fn narrator_names(&self) -> Vec<String> {
        self.narrators.iter().map(|n| n.name().to_string()).collect()
    }
}

impl Validator for Book {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.id.as_str().trim().is_empty() {
            errors.push("Book id cannot be empty".to_string());
        }

        if self.title.trim().is_empty() {
            errors.push("Title cannot be empty".to_string());
        }

        for format in &self.formats {
            if let Err(format_errors) = format.validate() {
                errors.extend(format_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapters(secs: &[u64]) -> Vec<Chapter> {
        secs.iter()
            .enumerate()
            .map(|(i, s)| Chapter::new(i as u32 + 1, None, Duration::from_seconds(*s)))
            .collect()
    }

    #[test]
    fn test_book_id_display() {
        let id = BookId::new("9788417");
        assert_eq!(id.to_string(), "9788417");
        assert_eq!(id.as_str(), "9788417");
    }

    #[test]
    fn test_contributor_name() {
        let named = Contributor::named("Ana Pérez");
        let profile = Contributor::Profile {
            id: Some("a1".to_string()),
            name: "Luis Gómez".to_string(),
            deep_link: None,
        };
        assert_eq!(named.name(), "Ana Pérez");
        assert_eq!(profile.name(), "Luis Gómez");
    }

    #[test]
    fn test_chapter_display_title_fallback() {
        let blank = Chapter::new(3, Some("   ".to_string()), Duration::from_seconds(10));
        let missing = Chapter::new(4, None, Duration::from_seconds(10));
        let titled = Chapter::new(5, Some("Epilogue".to_string()), Duration::from_seconds(10));

        assert_eq!(blank.display_title(), "Chapter 3");
        assert_eq!(missing.display_title(), "Chapter 4");
        assert_eq!(titled.display_title(), "Epilogue");
    }

    #[test]
    fn test_format_from_chapters() {
        let format = AudioFormat::from_chapters(chapters(&[300, 450, 600]));
        assert!(format.is_audiobook());
        assert_eq!(format.chapter_count(), 3);
        assert_eq!(format.total_duration, Duration::from_seconds(1350));
        assert!(format.is_valid());
    }

    #[test]
    fn test_format_total_mismatch_is_invalid() {
        let mut format = AudioFormat::from_chapters(chapters(&[300, 450]));
        format.total_duration = Duration::from_seconds(800);
        assert!(!format.is_valid());
    }

    #[test]
    fn test_format_without_chapters_is_valid() {
        let format = AudioFormat {
            kind: AUDIOBOOK_FORMAT.to_string(),
            total_duration: Duration::from_seconds(1200),
            chapters: Vec::new(),
            cover: None,
        };
        assert!(!format.has_chapters());
        assert!(format.is_valid());
    }

    #[test]
    fn test_book_duration_display() {
        let d = BookDuration { hours: 5, minutes: 0, seconds: 12 };
        assert_eq!(d.to_string(), "5h 0m 12s");
        let d = BookDuration { hours: 0, minutes: 12, seconds: 0 };
        assert_eq!(d.to_string(), "12m");
        assert_eq!(BookDuration::default().to_string(), "0s");
    }

    #[test]
    fn test_book_audiobook_format() {
        let mut book = Book::new("b1", "El camino");
        assert!(book.audiobook_format().is_none());

        book.formats.push(AudioFormat {
            kind: "ebook".to_string(),
            total_duration: Duration::ZERO,
            chapters: Vec::new(),
            cover: None,
        });
        book.formats.push(AudioFormat::from_chapters(chapters(&[60])));

        let format = book.audiobook_format().expect("audiobook format");
        assert_eq!(format.chapter_count(), 1);
    }

    #[test]
    fn test_book_validation_empty_title() {
        let book = Book::new("b1", "   ");
        assert!(!book.is_valid());
    }

    #[test]
    fn test_book_serde_roundtrip() {
        let mut book = Book::new("b1", "Title");
        book.authors.push(Contributor::named("Someone"));
        let json = serde_json::to_string(&book).expect("serialize");
        let back: Book = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, book);
    }
}
