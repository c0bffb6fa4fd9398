//! Playback state for Audioteca
//!
//! Everything here is independent of how audio is actually produced: the host
//! supplies a [`MediaElement`] and feeds its events back into a
//! [`PlaybackSession`].

mod chapters;
mod clock;
mod error;
mod media;
mod reload;
mod session;
mod sleep_timer;

pub use chapters::{chapter_at, chapter_start, ChapterList};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PlaybackError, PlaybackResult};
pub use media::{AttachedMedia, Generation, MediaElement, MediaEvent, MediaEventKind};
pub use reload::{ReloadDecision, ReloadPolicy, ReloadState};
pub use session::{
    LoadRequest, PlaybackSession, Progress, SessionConfig, SessionEvent, SessionStatus,
};
pub use sleep_timer::{ActiveTimer, SleepTimer, TimerChange, DEFAULT_PRESETS};
