// FILE: crates/playback/src/session.rs
//! Playback session state machine
//!
//! A session owns one media resource at a time and is driven from a single
//! thread through user operations, [`PlaybackSession::handle`] for media
//! events and [`PlaybackSession::tick`] for deadlines. Changes are published
//! as [`SessionEvent`]s on non-blocking channels.

use crate::chapters::ChapterList;
use crate::clock::Clock;
use crate::error::{PlaybackError, PlaybackResult};
use crate::media::{AttachedMedia, Generation, MediaElement, MediaEvent, MediaEventKind};
use crate::reload::{ReloadDecision, ReloadPolicy};
use crate::sleep_timer::{ActiveTimer, SleepTimer, TimerChange};
use audioteca_core::{Duration, PlaybackSpeed, Timestamp, Volume};
use audioteca_resilience::RetryPolicy;
use crossbeam_channel::{unbounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Notifications published by the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Position {
        position: Duration,
        chapter: Option<usize>,
    },
    ChapterChanged {
        chapter: usize,
    },
    StatusChanged {
        status: SessionStatus,
    },
    ReloadScheduled {
        attempt: usize,
        max_attempts: usize,
        delay: Duration,
    },
    LoadFailed {
        attempts: usize,
    },
    SleepTimerSet {
        minutes: u32,
        ends_at: Timestamp,
    },
    SleepTimerCancelled,
    SleepTimerExpired,
}

/// Session settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub volume: Volume,
    pub speed: PlaybackSpeed,
    /// Failure bound and delay for media reloads
    pub reload: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            volume: Volume::FULL,
            speed: PlaybackSpeed::NORMAL,
            reload: RetryPolicy::fixed(10, std::time::Duration::from_millis(1000)),
        }
    }
}

/// What to load and how to start
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub url: String,
    pub chapters: ChapterList,
    /// Position to seek to once metadata is available
    pub start_at: Duration,
    /// Start playing as soon as the resource is ready
    pub autoplay: bool,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>, chapters: ChapterList) -> Self {
        Self {
            url: url.into(),
            chapters,
            start_at: Duration::ZERO,
            autoplay: false,
        }
    }

    pub fn starting_at(mut self, position: Duration) -> Self {
        self.start_at = position;
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }
}

/// Snapshot of listening progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub position: Duration,
    pub duration: Duration,
    /// Overall progress, 0 to 100
    pub percent: f64,
    /// Listening time left at the current speed
    pub remaining: Duration,
    pub chapter: Option<usize>,
    pub chapter_count: usize,
}

pub struct PlaybackSession {
    status: SessionStatus,
    media: Option<AttachedMedia>,
    generation: Generation,
    chapters: ChapterList,
    chapter: Option<usize>,
    position: Duration,
    duration: Option<Duration>,
    pending_seek: Option<Duration>,
    volume: Volume,
    speed: PlaybackSpeed,
    play_intent: bool,
    reload: ReloadPolicy,
    sleep_timer: SleepTimer,
    clock: Box<dyn Clock>,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl PlaybackSession {
    /// Creates an idle session; fails if the reload policy is unusable
    pub fn new(config: SessionConfig, clock: Box<dyn Clock>) -> PlaybackResult<Self> {
        let reload = ReloadPolicy::new(config.reload)?;
        Ok(Self {
            status: SessionStatus::Idle,
            media: None,
            generation: Generation::default(),
            chapters: ChapterList::default(),
            chapter: None,
            position: Duration::ZERO,
            duration: None,
            pending_seek: None,
            volume: config.volume,
            speed: config.speed,
            play_intent: false,
            reload,
            sleep_timer: SleepTimer::new(),
            clock,
            subscribers: Vec::new(),
        })
    }

    /// Returns a new receiver for session events
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Current state of the session
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns true while audio is playing
    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    /// Last known playback position
    pub fn position(&self) -> Duration {
        self.position
    }

    /// Duration reported by the media, once known
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Volume applied to every attached resource
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// Playback rate applied to every attached resource
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// 0-based index of the chapter at the current position
    pub fn current_chapter(&self) -> Option<usize> {
        self.chapter
    }

    /// Chapters of the loaded resource
    pub fn chapters(&self) -> &ChapterList {
        &self.chapters
    }

    /// Generation of the attached resource; media events must carry it
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// URL of the attached resource
    pub fn url(&self) -> Option<&str> {
        self.media.as_ref().map(AttachedMedia::url)
    }

    /// Consecutive load failures so far
    pub fn load_failures(&self) -> usize {
        self.reload.failures()
    }

    /// Failures after which the session gives up
    pub fn max_load_failures(&self) -> usize {
        self.reload.max_failures()
    }

    /// True while an automatic reload is scheduled or in flight
    pub fn is_reload_pending(&self) -> bool {
        self.reload.is_pending()
    }

    /// The running sleep timer, if any
    pub fn sleep_timer(&self) -> Option<ActiveTimer> {
        self.sleep_timer.active()
    }

    /// Time left on the sleep timer by the session clock
    pub fn sleep_timer_remaining(&self) -> Option<Duration> {
        self.sleep_timer.remaining(self.clock.now())
    }

    /// Attaches a new resource, releasing the previous one first
    pub fn load(&mut self, element: Box<dyn MediaElement>, request: LoadRequest) -> Generation {
        if let Some(previous) = self.media.take() {
            log::debug!("Detaching {}", previous.url());
        }

        self.generation = self.generation.next();
        log::info!(
            "Loading {} (generation {})",
            request.url,
            self.generation.value()
        );

        let mut media = AttachedMedia::new(element, request.url, self.generation);
        media.element().set_volume(self.volume);
        media.element().set_rate(self.speed);

        self.chapters = request.chapters;
        self.duration = None;
        self.pending_seek = Some(request.start_at);
        self.position = request.start_at;
        self.chapter = self.chapters.index_at(self.position);
        self.play_intent = request.autoplay;
        self.reload.clear();
        self.set_status(SessionStatus::Loading);

        let result = media.load();
        self.media = Some(media);
        if let Err(e) = result {
            self.on_media_failure(&e.to_string());
        }

        self.generation
    }

    /// Releases the resource and returns to idle
    pub fn unload(&mut self) {
        if self.media.take().is_some() {
            self.generation = self.generation.next();
        }
        self.reload.clear();
        self.play_intent = false;
        self.duration = None;
        self.pending_seek = None;
        self.set_status(SessionStatus::Idle);
    }

    /// Starts playback from the paused state; returns true if it started
    pub fn play(&mut self) -> PlaybackResult<bool> {
        match self.status {
            SessionStatus::Paused => {}
            SessionStatus::Playing => return Ok(false),
            status => {
                log::debug!("Ignoring play while {}", status);
                return Ok(false);
            }
        }

        self.play_intent = true;
        let result = match self.media.as_mut() {
            Some(media) => media.element().play(),
            None => return Ok(false),
        };

        match result {
            Ok(()) => {
                self.set_status(SessionStatus::Playing);
                Ok(true)
            }
            Err(e) => {
                self.on_media_failure(&e.to_string());
                Ok(false)
            }
        }
    }

    /// Pauses playback; returns true if it was playing
    pub fn pause(&mut self) -> PlaybackResult<bool> {
        if self.status != SessionStatus::Playing {
            log::debug!("Ignoring pause while {}", self.status);
            return Ok(false);
        }

        self.play_intent = false;
        if let Some(media) = self.media.as_mut() {
            media.element().pause();
        }
        self.set_status(SessionStatus::Paused);
        Ok(true)
    }

    /// Switches between playing and paused
    pub fn toggle(&mut self) -> PlaybackResult<bool> {
        match self.status {
            SessionStatus::Playing => self.pause(),
            SessionStatus::Paused => self.play(),
            status => {
                log::debug!("Ignoring toggle while {}", status);
                Ok(false)
            }
        }
    }

    /// Moves to `position`, clamped to the media duration
    pub fn seek(&mut self, position: Duration) -> PlaybackResult<bool> {
        let target = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };

        match self.status {
            SessionStatus::Playing | SessionStatus::Paused => {
                if let Some(media) = self.media.as_mut() {
                    media.element().set_position(target);
                }
            }
            SessionStatus::Loading => {
                self.pending_seek = Some(target);
            }
            SessionStatus::Idle | SessionStatus::Error => {
                log::debug!("Ignoring seek while {}", self.status);
                return Ok(false);
            }
        }

        self.update_position(target);
        Ok(true)
    }

    /// Sets the volume; values outside 0..=1 are rejected
    pub fn set_volume(&mut self, volume: f32) -> PlaybackResult<()> {
        let volume = Volume::new(volume).map_err(|_| PlaybackError::InvalidVolume(volume))?;
        self.volume = volume;
        if let Some(media) = self.media.as_mut() {
            media.element().set_volume(volume);
        }
        Ok(())
    }

    /// Sets the playback rate; only the supported speeds are accepted
    pub fn set_speed(&mut self, speed: f32) -> PlaybackResult<()> {
        let speed = PlaybackSpeed::new(speed).map_err(|_| PlaybackError::InvalidSpeed(speed))?;
        self.speed = speed;
        if let Some(media) = self.media.as_mut() {
            media.element().set_rate(speed);
        }
        Ok(())
    }

    /// Seeks to the exact start of chapter `index` (0-based)
    pub fn set_chapter(&mut self, index: usize) -> PlaybackResult<bool> {
        let count = self.chapters.chapter_count();
        if count == 0 {
            return Err(PlaybackError::NoChapters);
        }
        let start = self
            .chapters
            .start_of(index)
            .ok_or(PlaybackError::ChapterOutOfRange { index, count })?;
        self.seek(start)
    }

    /// Seeks to the start of the following chapter; false on the last one
    pub fn next_chapter(&mut self) -> PlaybackResult<bool> {
        if !self.chapters.has_chapters() {
            return Err(PlaybackError::NoChapters);
        }
        match self.chapter {
            Some(current) if current + 1 < self.chapters.chapter_count() => {
                self.set_chapter(current + 1)
            }
            _ => Ok(false),
        }
    }

    /// Seeks to the start of the preceding chapter; false on the first one
    pub fn previous_chapter(&mut self) -> PlaybackResult<bool> {
        if !self.chapters.has_chapters() {
            return Err(PlaybackError::NoChapters);
        }
        match self.chapter {
            Some(current) if current > 0 => self.set_chapter(current - 1),
            _ => Ok(false),
        }
    }

    /// Starts a sleep timer, or cancels it when the same duration is already set
    pub fn set_sleep_timer(&mut self, minutes: u32) -> PlaybackResult<TimerChange> {
        if minutes == 0 {
            return Err(PlaybackError::InvalidTimer(minutes));
        }

        let change = self.sleep_timer.toggle(minutes, self.clock.now());
        match change {
            TimerChange::Started(timer) => {
                log::info!("Sleep timer set for {} minutes", minutes);
                self.emit(SessionEvent::SleepTimerSet {
                    minutes: timer.minutes,
                    ends_at: timer.ends_at,
                });
            }
            TimerChange::Cancelled => {
                log::info!("Sleep timer cancelled");
                self.emit(SessionEvent::SleepTimerCancelled);
            }
        }
        Ok(change)
    }

    /// Clears the sleep timer; returns true if one was running
    pub fn cancel_sleep_timer(&mut self) -> bool {
        let cancelled = self.sleep_timer.cancel();
        if cancelled {
            self.emit(SessionEvent::SleepTimerCancelled);
        }
        cancelled
    }

    /// Manual reload after the failure bound was reached
    pub fn retry(&mut self) -> PlaybackResult<bool> {
        if self.status != SessionStatus::Error {
            log::debug!("Ignoring retry while {}", self.status);
            return Ok(false);
        }

        log::info!("Manual retry requested");
        self.reload.reset();
        self.issue_reload();
        Ok(true)
    }

    /// Applies a media event; events from a replaced resource are dropped
    pub fn handle(&mut self, event: MediaEvent) {
        if self.media.is_none() || event.generation != self.generation {
            log::debug!(
                "Dropping {:?} from generation {} (current {})",
                event.kind,
                event.generation.value(),
                self.generation.value()
            );
            return;
        }

        match event.kind {
            MediaEventKind::MetadataLoaded { duration } => self.on_metadata(duration),
            MediaEventKind::TimeUpdate { position } => self.on_time_update(position),
            MediaEventKind::Ended => self.on_ended(),
            MediaEventKind::Error { message } => self.on_media_failure(&message),
        }
    }

    /// Fires due reloads and sleep-timer expiry
    pub fn tick(&mut self, now: Timestamp) {
        if self.reload.take_due(now) {
            self.issue_reload();
        }

        if self.sleep_timer.take_expired(now) {
            log::info!("Sleep timer expired");
            self.play_intent = false;
            if self.status == SessionStatus::Playing {
                if let Some(media) = self.media.as_mut() {
                    media.element().pause();
                }
                self.set_status(SessionStatus::Paused);
            }
            self.emit(SessionEvent::SleepTimerExpired);
        }
    }

    /// Overall progress and listening time left at the current speed
    pub fn progress(&self) -> Progress {
        let duration = self.duration.unwrap_or_else(|| self.chapters.total());
        let position = self.position.min(duration);
        let percent = if duration.is_zero() {
            0.0
        } else {
            position.as_millis() as f64 / duration.as_millis() as f64 * 100.0
        };
        let left = duration.saturating_sub(position);
        let remaining = Duration::from_secs_f64(left.as_secs_f64() / self.speed.value() as f64);

        Progress {
            position,
            duration,
            percent,
            remaining,
            chapter: self.chapter,
            chapter_count: self.chapters.chapter_count(),
        }
    }

    fn on_metadata(&mut self, duration: Duration) {
        self.duration = Some(duration);
        if self.status != SessionStatus::Loading {
            return;
        }

        self.reload.on_loaded();
        if self.chapters.has_chapters() && self.chapters.total() != duration {
            log::warn!(
                "Media duration {}ms differs from chapter total {}ms",
                duration.as_millis(),
                self.chapters.total().as_millis()
            );
        }

        let target = self.pending_seek.take().unwrap_or(self.position).min(duration);
        if let Some(media) = self.media.as_mut() {
            media.element().set_position(target);
        }
        self.update_position(target);

        if !self.play_intent {
            self.set_status(SessionStatus::Paused);
            return;
        }

        let result = match self.media.as_mut() {
            Some(media) => media.element().play(),
            None => return,
        };
        match result {
            Ok(()) => self.set_status(SessionStatus::Playing),
            Err(e) => self.on_media_failure(&e.to_string()),
        }
    }

    fn on_time_update(&mut self, position: Duration) {
        if !matches!(
            self.status,
            SessionStatus::Playing | SessionStatus::Paused
        ) {
            return;
        }
        let position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.update_position(position);
    }

    fn on_ended(&mut self) {
        if self.status != SessionStatus::Playing {
            return;
        }

        let next = self
            .chapter
            .map(|c| c + 1)
            .filter(|n| *n < self.chapters.chapter_count());

        if let Some(start) = next.and_then(|n| self.chapters.start_of(n)) {
            log::debug!("Advancing to chapter {}", next.map_or(0, |n| n + 1));
            let result = match self.media.as_mut() {
                Some(media) => {
                    media.element().set_position(start);
                    media.element().play()
                }
                None => return,
            };
            self.update_position(start);
            if let Err(e) = result {
                self.on_media_failure(&e.to_string());
            }
            return;
        }

        self.play_intent = false;
        if let Some(duration) = self.duration {
            self.update_position(duration);
        }
        if let Some(media) = self.media.as_mut() {
            media.element().pause();
        }
        self.set_status(SessionStatus::Paused);
    }

    fn on_media_failure(&mut self, message: &str) {
        if matches!(self.status, SessionStatus::Idle | SessionStatus::Error) {
            return;
        }

        let now = self.clock.now();
        match self.reload.on_failure(now) {
            ReloadDecision::Suppressed => {
                log::debug!("Media error while reload pending: {}", message);
            }
            ReloadDecision::Scheduled { attempt, due } => {
                let max_attempts = self.reload.max_failures();
                log::warn!(
                    "Media error: {}; reload {}/{} scheduled",
                    message,
                    attempt,
                    max_attempts
                );
                self.set_status(SessionStatus::Loading);
                self.emit(SessionEvent::ReloadScheduled {
                    attempt,
                    max_attempts,
                    delay: now.until(due),
                });
            }
            ReloadDecision::Exhausted { attempts } => {
                log::error!("Media failed after {} attempts: {}", attempts, message);
                self.set_status(SessionStatus::Error);
                self.emit(SessionEvent::LoadFailed { attempts });
            }
        }
    }

    fn issue_reload(&mut self) {
        let result = match self.media.as_mut() {
            Some(media) => {
                log::info!("Reloading {}", media.url());
                media.load()
            }
            None => return,
        };

        // Resume from where playback stopped once metadata arrives
        if self.pending_seek.is_none() {
            self.pending_seek = Some(self.position);
        }
        self.set_status(SessionStatus::Loading);

        if let Err(e) = result {
            self.on_media_failure(&e.to_string());
        }
    }

    fn update_position(&mut self, position: Duration) {
        self.position = position;

        let chapter = self.chapters.index_at(position);
        if chapter != self.chapter {
            self.chapter = chapter;
            if let Some(chapter) = chapter {
                self.emit(SessionEvent::ChapterChanged { chapter });
            }
        }

        self.emit(SessionEvent::Position {
            position,
            chapter: self.chapter,
        });
    }

    fn set_status(&mut self, status: SessionStatus) {
        if self.status == status {
            return;
        }
        log::debug!("Session {} -> {}", self.status, status);
        self.status = status;
        self.emit(SessionEvent::StatusChanged { status });
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|tx| match tx.try_send(event.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("status", &self.status)
            .field("media", &self.media)
            .field("position", &self.position)
            .field("duration", &self.duration)
            .field("chapter", &self.chapter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use audioteca_core::Chapter;

    struct NullMedia;

    impl MediaElement for NullMedia {
        fn load(&mut self, _url: &str) -> PlaybackResult<()> {
            Ok(())
        }
        fn play(&mut self) -> PlaybackResult<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn set_position(&mut self, _position: Duration) {}
        fn set_volume(&mut self, _volume: Volume) {}
        fn set_rate(&mut self, _speed: PlaybackSpeed) {}
        fn release(&mut self) {}
    }

    fn chapters() -> ChapterList {
        ChapterList::new(vec![
            Chapter::new(1, None, Duration::from_seconds(300)),
            Chapter::new(2, None, Duration::from_seconds(450)),
            Chapter::new(3, None, Duration::from_seconds(600)),
        ])
    }

    fn ready_session() -> PlaybackSession {
        let clock = ManualClock::new(Timestamp::from_millis(0));
        let mut session =
            PlaybackSession::new(SessionConfig::default(), Box::new(clock)).expect("session");
        let generation = session.load(Box::new(NullMedia), LoadRequest::new("u", chapters()));
        session.handle(MediaEvent::new(
            generation,
            MediaEventKind::MetadataLoaded {
                duration: Duration::from_seconds(1350),
            },
        ));
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = PlaybackSession::new(
            SessionConfig::default(),
            Box::new(ManualClock::default()),
        )
        .expect("session");
        assert_eq!(session.status(), SessionStatus::Idle);
        assert_eq!(session.max_load_failures(), 10);
    }

    #[test]
    fn test_controls_are_noops_when_idle() {
        let mut session = PlaybackSession::new(
            SessionConfig::default(),
            Box::new(ManualClock::default()),
        )
        .expect("session");
        assert!(!session.play().unwrap());
        assert!(!session.pause().unwrap());
        assert!(!session.toggle().unwrap());
        assert!(!session.seek(Duration::from_seconds(5)).unwrap());
    }

    #[test]
    fn test_metadata_without_autoplay_pauses() {
        let session = ready_session();
        assert_eq!(session.status(), SessionStatus::Paused);
        assert_eq!(session.duration(), Some(Duration::from_seconds(1350)));
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut session = ready_session();
        session.seek(Duration::from_seconds(5000)).unwrap();
        assert_eq!(session.position(), Duration::from_seconds(1350));
        assert_eq!(session.current_chapter(), Some(2));
    }

    #[test]
    fn test_set_chapter_errors() {
        let mut session = ready_session();
        assert!(matches!(
            session.set_chapter(3),
            Err(PlaybackError::ChapterOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn test_progress_divides_remaining_by_speed() {
        let mut session = ready_session();
        session.seek(Duration::from_seconds(350)).unwrap();
        session.set_speed(2.0).unwrap();

        let progress = session.progress();
        assert_eq!(progress.remaining, Duration::from_seconds(500));
        assert!((progress.percent - 350.0 / 1350.0 * 100.0).abs() < 1e-9);
        assert_eq!(progress.chapter, Some(1));
    }

    #[test]
    fn test_sleep_timer_requires_minutes() {
        let mut session = ready_session();
        assert!(matches!(
            session.set_sleep_timer(0),
            Err(PlaybackError::InvalidTimer(0))
        ));
    }
}
