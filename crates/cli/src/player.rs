//! Terminal player
//!
//! There is no audio output: a [`SimulatedMedia`] element advances its clock
//! with wall time and the playback rate, and the session reacts to it exactly
//! as it would to a real resource.

use crate::context::{report, AppContext};
use anyhow::{anyhow, Context, Result};
use audioteca_config::PlayerConfig;
use audioteca_core::{
    AppError, Book, BookId, Bookmark, Duration, PlaybackSpeed, Timestamp, Volume,
    SUPPORTED_SPEEDS,
};
use audioteca_playback::{
    ChapterList, LoadRequest, MediaElement, MediaEvent, MediaEventKind, PlaybackError,
    PlaybackResult, PlaybackSession, SessionConfig, SessionEvent, SessionStatus, SystemClock,
};
use audioteca_resilience::RetryPolicy;
use audioteca_storage::{ClientState, RecentBook, ResumeCheckpointer, ResumeRecord};
use clap::ArgMatches;
use console::{style, Key, Term};
use crossbeam_channel::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration as StdDuration, Instant};
use tokio::sync::mpsc;

const TICK: StdDuration = StdDuration::from_millis(250);
const SEEK_STEP: Duration = Duration::from_millis(10_000);
const VOLUME_STEP: f32 = 0.1;

#[derive(Debug)]
struct Track {
    url: String,
    duration: Duration,
    position: Duration,
    rate: f32,
    volume: f32,
    playing: bool,
    loading: bool,
    released: bool,
    failures_left: usize,
}

/// Media element whose clock advances with wall time and playback rate
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    track: Arc<Mutex<Track>>,
}

impl SimulatedMedia {
    pub fn new(duration: Duration) -> Self {
        Self {
            track: Arc::new(Mutex::new(Track {
                url: String::new(),
                duration,
                position: Duration::ZERO,
                rate: 1.0,
                volume: 1.0,
                playing: false,
                loading: false,
                released: false,
                failures_left: 0,
            })),
        }
    }

    /// The next `count` loads report a media error instead of metadata
    pub fn with_failures(self, count: usize) -> Self {
        self.track().failures_left = count;
        self
    }

    fn track(&self) -> MutexGuard<'_, Track> {
        self.track.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_released(&self) -> bool {
        self.track().released
    }

    pub fn volume(&self) -> f32 {
        self.track().volume
    }

    /// Moves the clock forward by `elapsed` of wall time
    ///
    /// Returns the events the element would have fired meanwhile.
    pub fn advance(&self, elapsed: Duration) -> Vec<MediaEventKind> {
        let mut track = self.track();
        if track.released {
            return Vec::new();
        }

        if track.loading {
            track.loading = false;
            if track.failures_left > 0 {
                track.failures_left -= 1;
                return vec![MediaEventKind::Error {
                    message: format!("network error while fetching {}", track.url),
                }];
            }
            return vec![MediaEventKind::MetadataLoaded {
                duration: track.duration,
            }];
        }

        if !track.playing {
            return Vec::new();
        }

        let step = Duration::from_secs_f64(elapsed.as_secs_f64() * f64::from(track.rate));
        track.position = (track.position + step).min(track.duration);
        let mut events = vec![MediaEventKind::TimeUpdate {
            position: track.position,
        }];
        if track.position >= track.duration {
            track.playing = false;
            events.push(MediaEventKind::Ended);
        }
        events
    }
}

impl MediaElement for SimulatedMedia {
    fn load(&mut self, url: &str) -> PlaybackResult<()> {
        let mut track = self.track();
        track.url = url.to_string();
        track.loading = true;
        track.playing = false;
        track.released = false;
        Ok(())
    }

    fn play(&mut self) -> PlaybackResult<()> {
        let mut track = self.track();
        if track.released {
            return Err(PlaybackError::Media("resource released".to_string()));
        }
        track.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.track().playing = false;
    }

    fn set_position(&mut self, position: Duration) {
        let mut track = self.track();
        track.position = position.min(track.duration);
    }

    fn set_volume(&mut self, volume: Volume) {
        self.track().volume = volume.value();
    }

    fn set_rate(&mut self, speed: PlaybackSpeed) {
        self.track().rate = speed.value();
    }

    fn release(&mut self) {
        let mut track = self.track();
        track.playing = false;
        track.released = true;
    }
}

/// What the player loop should do after a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Bookmark,
    Quit,
}

/// Session settings derived from the player config
pub fn session_config(player: &PlayerConfig) -> Result<SessionConfig> {
    let volume = Volume::new(player.default_volume).map_err(|e| anyhow!(e))?;
    let speed = PlaybackSpeed::new(player.default_speed).map_err(|e| anyhow!(e))?;
    Ok(SessionConfig {
        volume,
        speed,
        reload: RetryPolicy::fixed(player.max_load_failures as usize, player.retry_delay()),
    })
}

/// Where playback starts
///
/// An explicit chapter (1-based) wins, then `from_start`, then the saved
/// position. A saved position at the very end restarts the book.
pub fn start_position(
    chapters: &ChapterList,
    duration: Duration,
    saved: Option<&ResumeRecord>,
    chapter: Option<usize>,
    from_start: bool,
) -> PlaybackResult<Duration> {
    if let Some(number) = chapter {
        let count = chapters.chapter_count();
        if count == 0 {
            return Err(PlaybackError::NoChapters);
        }
        let index = number.saturating_sub(1);
        return chapters
            .start_of(index)
            .filter(|_| number >= 1)
            .ok_or(PlaybackError::ChapterOutOfRange { index, count });
    }

    if from_start {
        return Ok(Duration::ZERO);
    }

    match saved {
        Some(record) if record.position < duration => Ok(record.position),
        _ => Ok(Duration::ZERO),
    }
}

/// Length of the playable media, preferring the audiobook format
pub fn media_duration(book: &Book) -> Duration {
    let from_format = book
        .audiobook_format()
        .map(|f| {
            if f.total_duration.is_zero() {
                f.chapters_total()
            } else {
                f.total_duration
            }
        })
        .unwrap_or_default();
    if !from_format.is_zero() {
        return from_format;
    }

    let d = book.duration;
    Duration::from_seconds(
        u64::from(d.hours) * 3600 + u64::from(d.minutes) * 60 + u64::from(d.seconds),
    )
}

/// Applies a key press to the session
pub fn apply_key(session: &mut PlaybackSession, key: &Key, presets: &[u32]) -> PlaybackResult<Control> {
    match key {
        Key::Char(' ') => {
            session.toggle()?;
        }
        Key::ArrowLeft => {
            session.seek(session.position().saturating_sub(SEEK_STEP))?;
        }
        Key::ArrowRight => {
            session.seek(session.position() + SEEK_STEP)?;
        }
        Key::Char('n') => {
            session.next_chapter()?;
        }
        Key::Char('p') => {
            session.previous_chapter()?;
        }
        Key::Char('+') | Key::Char('=') => {
            let volume = (session.volume().value() + VOLUME_STEP).min(1.0);
            session.set_volume(round_volume(volume))?;
        }
        Key::Char('-') | Key::Char('_') => {
            let volume = (session.volume().value() - VOLUME_STEP).max(0.0);
            session.set_volume(round_volume(volume))?;
        }
        Key::Char(']') => {
            if let Some(speed) = step_speed(session.speed().value(), true) {
                session.set_speed(speed)?;
            }
        }
        Key::Char('[') => {
            if let Some(speed) = step_speed(session.speed().value(), false) {
                session.set_speed(speed)?;
            }
        }
        Key::Char('s') => cycle_sleep_timer(session, presets)?,
        Key::Char('r') => {
            session.retry()?;
        }
        Key::Char('b') => return Ok(Control::Bookmark),
        Key::Char('q') | Key::Char('\u{3}') | Key::Escape => return Ok(Control::Quit),
        _ => {}
    }
    Ok(Control::Continue)
}

fn round_volume(volume: f32) -> f32 {
    (volume * 10.0).round() / 10.0
}

/// Neighbouring supported speed, if any
fn step_speed(current: f32, faster: bool) -> Option<f32> {
    let index = SUPPORTED_SPEEDS
        .iter()
        .position(|s| (*s - current).abs() < f32::EPSILON)?;
    if faster {
        SUPPORTED_SPEEDS.get(index + 1).copied()
    } else {
        index.checked_sub(1).map(|i| SUPPORTED_SPEEDS[i])
    }
}

/// Off, then each preset in turn, then off again
fn cycle_sleep_timer(session: &mut PlaybackSession, presets: &[u32]) -> PlaybackResult<()> {
    let current = session.sleep_timer().map(|t| t.minutes);
    let next = match current.and_then(|m| presets.iter().position(|p| *p == m)) {
        Some(i) => presets.get(i + 1).copied(),
        None if current.is_some() => None,
        None => presets.first().copied(),
    };

    match next {
        Some(minutes) => {
            session.set_sleep_timer(minutes)?;
        }
        None => {
            session.cancel_sleep_timer();
        }
    }
    Ok(())
}

/// One status line: state, position, progress, chapter, speed, volume and timer
pub fn status_line(session: &PlaybackSession) -> String {
    let progress = session.progress();
    let icon = match session.status() {
        SessionStatus::Playing => style("▶").green(),
        SessionStatus::Paused => style("⏸").yellow(),
        SessionStatus::Loading => style("…").cyan(),
        SessionStatus::Error => style("✗").red(),
        SessionStatus::Idle => style("■").dim(),
    };

    let width = 30;
    let filled = ((progress.percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);

    let mut line = format!(
        "{} {} / {} [{}{}] {:>5.1}% | Ch {} | {} | vol {:>3}%",
        icon,
        progress.position.as_clock(),
        progress.duration.as_clock(),
        "=".repeat(filled),
        " ".repeat(width - filled),
        progress.percent,
        session.chapters().chapter_progress(progress.chapter),
        session.speed(),
        (session.volume().value() * 100.0).round() as u32,
    );
    if let Some(remaining) = session.sleep_timer_remaining() {
        line.push_str(&format!(" | sleep {}", remaining.as_clock()));
    }
    line
}

/// Play a book from the catalog
pub async fn play_book(ctx: &AppContext, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("Book ID is required"))?;
    let id = BookId::new(id.trim());
    let chapter = matches.get_one::<usize>("chapter").copied();
    let sleep = matches.get_one::<u32>("sleep").copied();
    let from_start = matches.get_flag("from-start");
    let failures = matches.get_one::<usize>("simulate-failures").copied().unwrap_or(0);

    let catalog = ctx.catalog().await?;
    let book = catalog.book(&id).await.map_err(report)?;

    let duration = media_duration(&book);
    if duration.is_zero() {
        let err = AppError::NoPlayableAudio {
            id: book.id.to_string(),
        };
        let summary = err.user_message();
        return Err(anyhow::Error::new(err).context(summary));
    }
    let url = catalog.media_url(&book.download_id).await.map_err(report)?;

    let state = ctx.state()?;
    state.recent.add(RecentBook::from(&book));

    let chapters = book
        .audiobook_format()
        .map(ChapterList::from_format)
        .unwrap_or_default();
    let saved = state.resume.get(&book.id);
    let start = start_position(&chapters, duration, saved.as_ref(), chapter, from_start)
        .map_err(AppError::from)
        .context("Cannot start at that chapter")?;

    let player_config = &ctx.config.player;
    let mut session = PlaybackSession::new(session_config(player_config)?, Box::new(SystemClock))
        .map_err(AppError::from)
        .context("Invalid player settings")?;
    let events = session.subscribe();
    let checkpointer = ResumeCheckpointer::new(
        state.resume.clone(),
        book.id.clone(),
        session.subscribe(),
        player_config.autosave_interval(),
    );

    println!("\n{} {}", style("▶").green().bold(), style(&book.title).bold());
    if !book.authors.is_empty() {
        println!("by {}", book.author_names().join(", "));
    }
    if !start.is_zero() {
        println!("Resuming at {}", start.as_clock());
    }

    let media = SimulatedMedia::new(duration).with_failures(failures);
    session.load(
        Box::new(media.clone()),
        LoadRequest::new(url, chapters)
            .starting_at(start)
            .autoplay(player_config.autoplay),
    );
    if let Some(minutes) = sleep {
        session
            .set_sleep_timer(minutes)
            .map_err(AppError::from)
            .context("Invalid sleep timer")?;
    }

    let mut player = Player {
        session,
        media,
        events,
        checkpointer,
        state,
        presets: player_config.sleep_timer_presets.clone(),
        term: Term::stdout(),
    };
    player.run().await
}

struct Player {
    session: PlaybackSession,
    media: SimulatedMedia,
    events: Receiver<SessionEvent>,
    checkpointer: ResumeCheckpointer,
    state: ClientState,
    presets: Vec<u32>,
    term: Term,
}

impl Player {
    async fn run(&mut self) -> Result<()> {
        let interactive = self.term.is_term();
        if interactive {
            self.print_controls();
            let _ = self.term.hide_cursor();
        }

        let mut keys = spawn_key_reader(&self.term);
        let mut keys_open = keys.is_some();
        let mut ticker = tokio::time::interval(TICK);
        let mut last = Instant::now();
        let mut failed = false;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = Duration::from_millis(now.duration_since(last).as_millis() as u64);
                    last = now;

                    let generation = self.session.generation();
                    for kind in self.media.advance(elapsed) {
                        self.session.handle(MediaEvent::new(generation, kind));
                    }
                    self.session.tick(Timestamp::now());
                    self.checkpointer.drain(Timestamp::now());

                    let outcome = self.report_events(interactive);
                    if interactive {
                        let _ = self.term.clear_line();
                        let _ = self.term.write_str(&status_line(&self.session));
                    }
                    match outcome {
                        Outcome::Continue => {}
                        Outcome::Stop => break,
                        Outcome::Failed => {
                            if !interactive {
                                failed = true;
                                break;
                            }
                        }
                    }
                    if !interactive && self.session.status() == SessionStatus::Paused {
                        break;
                    }
                }
                key = next_key(&mut keys), if keys_open => {
                    match key {
                        Some(key) => match apply_key(&mut self.session, &key, &self.presets) {
                            Ok(Control::Continue) => {}
                            Ok(Control::Bookmark) => self.bookmark_here(),
                            Ok(Control::Quit) => break,
                            Err(e) => self.announce(&style(AppError::from(e).to_string()).yellow().to_string()),
                        },
                        None => keys_open = false,
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        self.finish(interactive);
        if failed {
            let err = AppError::MediaLoadFailed {
                attempts: self.session.load_failures() as u32,
            };
            let summary = err.user_message();
            return Err(anyhow::Error::new(err).context(summary));
        }
        Ok(())
    }

    fn report_events(&mut self, interactive: bool) -> Outcome {
        let mut outcome = Outcome::Continue;
        let events: Vec<SessionEvent> = self.events.try_iter().collect();

        for event in events {
            match event {
                SessionEvent::ChapterChanged { chapter } => {
                    let title = self.session.chapters().title(chapter).unwrap_or_default();
                    self.announce(&format!(
                        "{} {}",
                        style(format!("Chapter {}", chapter + 1)).bold(),
                        title
                    ));
                }
                SessionEvent::ReloadScheduled {
                    attempt,
                    max_attempts,
                    delay,
                } => {
                    self.announce(&format!(
                        "{} Audio interrupted, reloading in {}s ({}/{})",
                        style("!").yellow().bold(),
                        delay.as_secs_f64().ceil() as u64,
                        attempt,
                        max_attempts
                    ));
                }
                SessionEvent::LoadFailed { attempts } => {
                    let err = AppError::MediaLoadFailed {
                        attempts: attempts as u32,
                    };
                    let hint = if interactive { " Press r to retry." } else { "" };
                    self.announce(&format!(
                        "{} {}{}",
                        style("✗").red().bold(),
                        err.user_message(),
                        hint
                    ));
                    outcome = Outcome::Failed;
                }
                SessionEvent::SleepTimerSet { minutes, .. } => {
                    self.announce(&format!("Sleep timer set for {} minutes", minutes));
                }
                SessionEvent::SleepTimerCancelled => self.announce("Sleep timer off"),
                SessionEvent::SleepTimerExpired => {
                    self.announce("Sleep timer expired, good night");
                    outcome = Outcome::Stop;
                }
                SessionEvent::StatusChanged {
                    status: SessionStatus::Paused,
                } if self.is_finished() => {
                    self.announce(&format!("{} Finished", style("✓").green().bold()));
                    outcome = Outcome::Stop;
                }
                _ => {}
            }
        }
        outcome
    }

    fn is_finished(&self) -> bool {
        let progress = self.session.progress();
        !progress.duration.is_zero() && progress.position >= progress.duration
    }

    fn bookmark_here(&mut self) {
        let position = self.session.position();
        let chapter = self.session.current_chapter().unwrap_or(0);
        let bookmark = Bookmark::new(self.checkpointer.book_id().clone(), chapter, position);
        if self.state.bookmarks.add(bookmark) {
            self.announce(&format!("Bookmarked {}", position.as_clock()));
        } else {
            self.announce(&style("Could not save bookmark").red().to_string());
        }
    }

    fn announce(&self, message: &str) {
        if self.term.is_term() {
            let _ = self.term.clear_line();
        }
        let _ = self.term.write_line(message);
    }

    fn print_controls(&self) {
        let _ = self.term.write_line(
            "  Space play/pause  ←/→ seek 10s  n/p chapter  +/- volume  [/] speed  s sleep  b bookmark  r retry  q quit",
        );
    }

    fn finish(&mut self, interactive: bool) {
        self.checkpointer.flush(Timestamp::now());
        let position = self.session.position();
        self.session.unload();

        if interactive {
            let _ = self.term.clear_line();
            let _ = self.term.show_cursor();
        }
        log::info!(
            "Stopped {} at {}",
            self.checkpointer.book_id(),
            position.as_clock()
        );
        println!("Saved position {}", position.as_clock());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Continue,
    Stop,
    Failed,
}

/// Reads keys on a blocking thread; `None` when stdout is not a terminal
fn spawn_key_reader(term: &Term) -> Option<mpsc::UnboundedReceiver<Key>> {
    if !term.is_term() {
        return None;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let term = term.clone();
    std::thread::spawn(move || loop {
        match term.read_key() {
            Ok(key) => {
                if tx.send(key).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::debug!("Key reader stopped: {}", e);
                let _ = tx.send(Key::Escape);
                break;
            }
        }
    });
    Some(rx)
}

async fn next_key(keys: &mut Option<mpsc::UnboundedReceiver<Key>>) -> Option<Key> {
    match keys {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
