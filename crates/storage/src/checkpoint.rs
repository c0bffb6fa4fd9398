//! Periodic resume checkpoints fed by session events

use crate::resume::ResumeStore;
use audioteca_core::{BookId, Duration, Timestamp};
use audioteca_playback::SessionEvent;
use crossbeam_channel::Receiver;

/// Drains position events and writes the latest one at most once per interval
pub struct ResumeCheckpointer {
    store: ResumeStore,
    book_id: BookId,
    events: Receiver<SessionEvent>,
    interval: Duration,
    last_write: Option<Timestamp>,
    pending: Option<(usize, Duration)>,
}

impl ResumeCheckpointer {
    pub fn new(
        store: ResumeStore,
        book_id: BookId,
        events: Receiver<SessionEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            book_id,
            events,
            interval,
            last_write: None,
            pending: None,
        }
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    /// Consumes queued events and writes if the interval has elapsed
    ///
    /// Returns true if a checkpoint was written.
    pub fn drain(&mut self, now: Timestamp) -> bool {
        for event in self.events.try_iter() {
            if let SessionEvent::Position { position, chapter } = event {
                self.pending = Some((chapter.unwrap_or(0), position));
            }
        }

        let due = match self.last_write {
            Some(last) => last.until(now) >= self.interval,
            None => true,
        };
        if due {
            self.write(now)
        } else {
            false
        }
    }

    /// Writes whatever is pending regardless of the interval
    pub fn flush(&mut self, now: Timestamp) -> bool {
        for event in self.events.try_iter() {
            if let SessionEvent::Position { position, chapter } = event {
                self.pending = Some((chapter.unwrap_or(0), position));
            }
        }
        self.write(now)
    }

    fn write(&mut self, now: Timestamp) -> bool {
        let Some((chapter, position)) = self.pending.take() else {
            return false;
        };
        log::debug!(
            "Checkpoint {} at {} (chapter {})",
            self.book_id,
            position,
            chapter + 1
        );
        self.last_write = Some(now);
        self.store.record_at(&self.book_id, chapter, position, now)
    }
}
