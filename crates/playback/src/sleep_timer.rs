// FILE: crates/playback/src/sleep_timer.rs
//! Sleep timer that pauses playback at a wall-clock deadline

use audioteca_core::{Duration, Timestamp};
use serde::{Deserialize, Serialize};

/// Preset durations offered by the player, in minutes
pub const DEFAULT_PRESETS: [u32; 6] = [15, 30, 45, 60, 90, 120];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub minutes: u32,
    pub ends_at: Timestamp,
}

/// Result of toggling the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerChange {
    Started(ActiveTimer),
    Cancelled,
}

/// Sleep timer state
///
/// Remaining time is always derived from the stored deadline and the
/// caller's clock, never from a counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SleepTimer {
    active: Option<ActiveTimer>,
}

impl SleepTimer {
    /// Creates an unset timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a timer for `minutes`, or cancels it if that duration is already active
    pub fn toggle(&mut self, minutes: u32, now: Timestamp) -> TimerChange {
        if self.active.map(|t| t.minutes) == Some(minutes) {
            self.active = None;
            return TimerChange::Cancelled;
        }

        let timer = ActiveTimer {
            minutes,
            ends_at: now.plus(Duration::from_minutes(minutes as u64)),
        };
        self.active = Some(timer);
        TimerChange::Started(timer)
    }

    /// Clears the timer; returns true if one was running
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// The running timer, if any
    pub fn active(&self) -> Option<ActiveTimer> {
        self.active
    }

    /// Returns true if a timer is running
    pub fn is_set(&self) -> bool {
        self.active.is_some()
    }

    /// Time left until the deadline, measured against `now`
    pub fn remaining(&self, now: Timestamp) -> Option<Duration> {
        self.active.map(|t| now.until(t.ends_at))
    }

    /// Clears and returns true if the deadline has passed
    pub fn take_expired(&mut self, now: Timestamp) -> bool {
        match self.active {
            Some(timer) if now >= timer.ends_at => {
                self.active = None;
                true
            }
            _ => false,
        }
    }
}
