//! JSON shapes served by the catalog backend
//!
//! These mirror the backend field names and are converted into the core
//! domain types once, at ingestion.

use audioteca_core::{
    AudioFormat, Book, BookDuration, BookId, Chapter, Contributor, Cover, Duration,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A credit as sent by the backend: a bare name or a profile record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireContributor {
    Name(String),
    #[serde(rename_all = "camelCase")]
    Profile {
        #[serde(default)]
        id: Option<String>,
        name: String,
        #[serde(default)]
        deep_link: Option<String>,
    },
}

impl From<WireContributor> for Contributor {
    fn from(wire: WireContributor) -> Self {
        match wire {
            WireContributor::Name(name) => Contributor::Named { name },
            WireContributor::Profile {
                id,
                name,
                deep_link,
            } => Contributor::Profile {
                id,
                name,
                deep_link,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireCover {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl From<WireCover> for Cover {
    fn from(wire: WireCover) -> Self {
        Cover {
            url: wire.url,
            width: wire.width,
            height: wire.height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireChapter {
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_in_seconds: Option<f64>,
    #[serde(default)]
    pub duration_in_milliseconds: Option<u64>,
}

impl WireChapter {
    /// Millisecond duration, falling back to the seconds field
    pub fn duration(&self) -> Duration {
        match (self.duration_in_milliseconds, self.duration_in_seconds) {
            (Some(ms), _) => Duration::from_millis(ms),
            (None, Some(secs)) => Duration::from_secs_f64(secs),
            (None, None) => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFormat {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub duration_in_milliseconds: u64,
    #[serde(default)]
    pub chapters: Vec<WireChapter>,
    #[serde(default)]
    pub cover: Option<WireCover>,
    #[serde(default)]
    pub takedown_date: Option<String>,
}

impl From<WireFormat> for AudioFormat {
    fn from(wire: WireFormat) -> Self {
        AudioFormat {
            kind: wire.kind,
            total_duration: Duration::from_millis(wire.duration_in_milliseconds),
            chapters: wire
                .chapters
                .into_iter()
                .map(|c| {
                    let duration = c.duration();
                    Chapter::new(c.number, c.title, duration)
                })
                .collect(),
            cover: wire.cover.map(Cover::from),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireAudiobook {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<WireContributor>,
    #[serde(default)]
    pub narrators: Vec<WireContributor>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub id_download: String,
    #[serde(default)]
    pub formats: Vec<WireFormat>,
    #[serde(default)]
    pub duration: WireDuration,
    #[serde(default)]
    pub cover: WireCover,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub is_abridged: bool,
}

impl WireAudiobook {
    /// Converts into a domain book keyed by `id`
    pub fn into_book(self, id: BookId) -> Book {
        let download_id = if self.id_download.is_empty() {
            id.as_str().to_string()
        } else {
            self.id_download
        };

        Book {
            id,
            title: self.title,
            authors: self.authors.into_iter().map(Contributor::from).collect(),
            narrators: self.narrators.into_iter().map(Contributor::from).collect(),
            genres: self.genres,
            description: self.description,
            language: self.language,
            download_id,
            formats: self.formats.into_iter().map(AudioFormat::from).collect(),
            duration: BookDuration {
                hours: self.duration.hours,
                minutes: self.duration.minutes,
                seconds: self.duration.seconds,
            },
            cover: self.cover.into(),
            original_title: self.original_title,
            is_abridged: self.is_abridged,
        }
    }
}

/// Books keyed by id, the layout of both list responses and catalog files
pub type WireBookMap = BTreeMap<String, WireAudiobook>;

/// Converts a keyed map into books ordered by id
pub fn books_from_map(map: WireBookMap) -> Vec<Book> {
    map.into_iter()
        .map(|(id, wire)| wire.into_book(BookId::new(id)))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WirePagination {
    pub total: usize,
    pub per_page: u32,
    pub current_page: u32,
    pub total_pages: u32,
}

/// Body of `GET /api/audiobooks`
#[derive(Debug, Clone, Deserialize)]
pub struct WireListResponse {
    pub data: WireBookMap,
    #[serde(default)]
    pub pagination: WirePagination,
}

/// Body of `GET /api/redirect/:id`
#[derive(Debug, Clone, Deserialize)]
pub struct WireRedirect {
    pub url: String,
}
