// crates/resilience/src/lib.rs
//! Retry policies for fault-tolerant operations
//!
//! A [`RetryPolicy`] describes how many attempts an operation gets and how
//! long to wait between them. It drives both the catalog client's request
//! retries and the player's media reload schedule.
//!
//! # Example
//!
//! ```rust
//! use audioteca_resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! // Ten attempts, one second apart
//! let policy = RetryPolicy::fixed(10, Duration::from_millis(1000));
//! assert!(policy.allows_retry(9));
//! assert!(!policy.allows_retry(10));
//! ```

mod error;
mod retry;

pub use error::{ResilienceError, ResilienceResult};
pub use retry::{with_retry, with_retry_async, RetryPolicy};
