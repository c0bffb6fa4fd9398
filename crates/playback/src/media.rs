// FILE: crates/playback/src/media.rs
//! Host-supplied media resource and its lifecycle

use crate::error::PlaybackResult;
use audioteca_core::{Duration, PlaybackSpeed, Volume};

/// An audio resource the host can load and drive
///
/// Implementations report progress back through [`MediaEvent`]s tagged with
/// the generation the session handed out for the resource.
pub trait MediaElement {
    /// Starts (or restarts) loading the resource at `url`
    fn load(&mut self, url: &str) -> PlaybackResult<()>;

    fn play(&mut self) -> PlaybackResult<()>;

    fn pause(&mut self);

    fn set_position(&mut self, position: Duration);

    fn set_volume(&mut self, volume: Volume);

    fn set_rate(&mut self, speed: PlaybackSpeed);

    /// Stops playback and frees the resource
    fn release(&mut self);
}

/// Identifies one attached resource; bumps every time the resource changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What the media resource reported
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    /// Metadata is available and the duration is known
    MetadataLoaded { duration: Duration },
    /// Playback position moved
    TimeUpdate { position: Duration },
    /// Reached the end of the resource
    Ended,
    /// Loading or playback failed
    Error { message: String },
}

/// A media event from a specific resource generation
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub generation: Generation,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn new(generation: Generation, kind: MediaEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Owns the active media resource and releases it when dropped
pub struct AttachedMedia {
    element: Box<dyn MediaElement>,
    url: String,
    generation: Generation,
}

impl AttachedMedia {
    pub fn new(element: Box<dyn MediaElement>, url: impl Into<String>, generation: Generation) -> Self {
        Self {
            element,
            url: url.into(),
            generation,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Issues a load of the resource URL
    pub fn load(&mut self) -> PlaybackResult<()> {
        self.element.load(&self.url)
    }

    pub fn element(&mut self) -> &mut dyn MediaElement {
        self.element.as_mut()
    }
}

impl Drop for AttachedMedia {
    fn drop(&mut self) {
        log::debug!(
            "Releasing media generation {} ({})",
            self.generation.value(),
            self.url
        );
        self.element.release();
    }
}

impl std::fmt::Debug for AttachedMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedMedia")
            .field("url", &self.url)
            .field("generation", &self.generation)
            .finish()
    }
}
