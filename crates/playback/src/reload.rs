// FILE: crates/playback/src/reload.rs
//! Bounded media reload schedule

use crate::error::PlaybackResult;
use audioteca_core::{Duration, Timestamp};
use audioteca_resilience::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// No reload pending
    Idle,
    /// A reload will be issued at `due`
    Scheduled { due: Timestamp },
    /// A reload was issued and its outcome is not known yet
    InFlight,
}

/// Outcome of reporting a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadDecision {
    /// A reload is already scheduled; the error was ignored
    Suppressed,
    /// A reload was scheduled
    Scheduled { attempt: usize, due: Timestamp },
    /// The failure bound was reached
    Exhausted { attempts: usize },
}

/// Counts consecutive load failures and schedules reloads until the bound
///
/// The bound is the number of failures that puts the session into the error
/// state; every earlier failure schedules one reload after the fixed delay.
#[derive(Debug, Clone)]
pub struct ReloadPolicy {
    policy: RetryPolicy,
    failures: usize,
    state: ReloadState,
}

impl ReloadPolicy {
    /// Uses the attempt bound and delay of `policy`; rejects an unusable policy
    pub fn new(policy: RetryPolicy) -> PlaybackResult<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            failures: 0,
            state: ReloadState::Idle,
        })
    }

    /// Ten failures, one second apart
    pub fn standard() -> Self {
        Self {
            policy: RetryPolicy::fixed(10, std::time::Duration::from_millis(1000)),
            failures: 0,
            state: ReloadState::Idle,
        }
    }

    /// Consecutive failures since the last successful load
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Failures that put the session into the error state
    pub fn max_failures(&self) -> usize {
        self.policy.max_attempts()
    }

    /// Current reload state
    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// True while a reload is scheduled or in flight
    pub fn is_pending(&self) -> bool {
        self.state != ReloadState::Idle
    }

    /// True once the failure bound is reached
    pub fn is_exhausted(&self) -> bool {
        !self.policy.allows_retry(self.failures)
    }

    /// Records a load or playback failure observed at `now`
    pub fn on_failure(&mut self, now: Timestamp) -> ReloadDecision {
        if let ReloadState::Scheduled { .. } = self.state {
            return ReloadDecision::Suppressed;
        }

        self.failures += 1;

        if !self.policy.allows_retry(self.failures) {
            self.state = ReloadState::Idle;
            return ReloadDecision::Exhausted {
                attempts: self.failures,
            };
        }

        let delay: Duration = self.policy.delay_for_attempt(self.failures).into();
        let due = now.plus(delay);
        self.state = ReloadState::Scheduled { due };
        ReloadDecision::Scheduled {
            attempt: self.failures,
            due,
        }
    }

    /// Moves a due reload to in-flight; returns true if the caller must issue it
    pub fn take_due(&mut self, now: Timestamp) -> bool {
        match self.state {
            ReloadState::Scheduled { due } if now >= due => {
                self.state = ReloadState::InFlight;
                true
            }
            _ => false,
        }
    }

    /// Metadata arrived: the resource is healthy again
    pub fn on_loaded(&mut self) {
        self.failures = 0;
        self.state = ReloadState::Idle;
    }

    /// Manual retry: start counting from zero
    pub fn reset(&mut self) {
        self.failures = 0;
        self.state = ReloadState::InFlight;
    }

    /// Forget everything, e.g. when the resource is replaced
    pub fn clear(&mut self) {
        self.failures = 0;
        self.state = ReloadState::Idle;
    }
}

impl Default for ReloadPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max: usize) -> ReloadPolicy {
        ReloadPolicy::new(RetryPolicy::fixed(max, std::time::Duration::from_millis(1000)))
            .expect("valid policy")
    }

    #[test]
    fn test_rejects_zero_bound() {
        assert!(ReloadPolicy::new(RetryPolicy::fixed(0, std::time::Duration::ZERO)).is_err());
    }

    #[test]
    fn test_failure_schedules_after_delay() {
        let mut reload = policy(10);
        let now = Timestamp::from_millis(5_000);

        let decision = reload.on_failure(now);
        assert_eq!(
            decision,
            ReloadDecision::Scheduled {
                attempt: 1,
                due: Timestamp::from_millis(6_000)
            }
        );
        assert!(reload.is_pending());
        assert!(!reload.take_due(Timestamp::from_millis(5_999)));
        assert!(reload.take_due(Timestamp::from_millis(6_000)));
        assert_eq!(reload.state(), ReloadState::InFlight);
    }

    #[test]
    fn test_errors_while_scheduled_are_suppressed() {
        let mut reload = policy(10);
        reload.on_failure(Timestamp::from_millis(0));
        assert_eq!(
            reload.on_failure(Timestamp::from_millis(10)),
            ReloadDecision::Suppressed
        );
        assert_eq!(reload.failures(), 1);
    }

    #[test]
    fn test_bound_reached_after_n_failures() {
        let mut reload = policy(3);
        let mut now = Timestamp::from_millis(0);

        for attempt in 1..3 {
            assert!(matches!(
                reload.on_failure(now),
                ReloadDecision::Scheduled { attempt: a, .. } if a == attempt
            ));
            now = now.plus(Duration::from_seconds(1));
            assert!(reload.take_due(now));
        }

        assert_eq!(
            reload.on_failure(now),
            ReloadDecision::Exhausted { attempts: 3 }
        );
        assert!(reload.is_exhausted());
        assert!(!reload.is_pending());
    }

    #[test]
    fn test_loaded_resets_count() {
        let mut reload = policy(3);
        reload.on_failure(Timestamp::from_millis(0));
        reload.take_due(Timestamp::from_millis(1_000));
        reload.on_loaded();
        assert_eq!(reload.failures(), 0);
        assert_eq!(reload.state(), ReloadState::Idle);
    }

    #[test]
    fn test_reset_after_exhaustion() {
        let mut reload = policy(1);
        assert_eq!(
            reload.on_failure(Timestamp::from_millis(0)),
            ReloadDecision::Exhausted { attempts: 1 }
        );
        reload.reset();
        assert_eq!(reload.failures(), 0);
        assert_eq!(reload.state(), ReloadState::InFlight);
    }
}
