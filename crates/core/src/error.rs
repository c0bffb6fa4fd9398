//! Error types and recovery strategies for Audioteca
//!
//! Errors are grouped into three severity tiers:
//! - **Recoverable**: retried automatically (transient catalog failures, media reloads)
//! - **Degraded**: one feature is unavailable but the rest keeps working
//! - **Blocking**: the current view cannot continue until the user acts
//!
//! No error is fatal to the application. Each error carries a recovery action
//! that front ends use to decide what to offer the user.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry with backoff (catalog temporarily unavailable)
    RetryWithBackoff,
    /// Reload the media resource after the configured delay
    ScheduledReload,
    /// Offer the user a reload control for the current view
    ManualReload,
    /// Send the user back to the catalog root
    ReturnToCatalog,
    /// Discard the stored value and continue with the default
    ResetState,
    /// Restore from the most recent backup
    RestoreBackup,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryWithBackoff => write!(f, "Retrying with backoff"),
            Self::ScheduledReload => write!(f, "Reloading media"),
            Self::ManualReload => write!(f, "Reload available"),
            Self::ReturnToCatalog => write!(f, "Returning to catalog"),
            Self::ResetState => write!(f, "Resetting stored state"),
            Self::RestoreBackup => write!(f, "Restoring from backup"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be automatically recovered from
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// Current view is blocked until the user acts
    Blocking,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Blocking => write!(f, "Blocking"),
        }
    }
}

/// Main error type for Audioteca
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Catalog Errors =====
    /// Catalog request failed at the transport level
    #[error("Catalog unavailable: {message}")]
    CatalogUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Catalog request exhausted its retries
    #[error("Catalog request failed after {attempts} attempts: {message}")]
    CatalogRetriesExhausted { attempts: u32, message: String },

    /// Catalog answered with something we could not read
    #[error("Invalid catalog response: {details}")]
    InvalidCatalogResponse { details: String },

    /// Requested book does not exist
    #[error("Book not found: {id}")]
    BookNotFound { id: String },

    // ===== Media Errors =====
    /// Media element reported a load or playback error
    #[error("Media error: {message}")]
    MediaError { message: String },

    /// Media resource failed to load after the retry bound was reached
    #[error("Media failed to load after {attempts} attempts")]
    MediaLoadFailed { attempts: u32 },

    /// Book has no playable audiobook rendition
    #[error("Book {id} has no playable audio")]
    NoPlayableAudio { id: String },

    /// Invalid playback position
    #[error("Invalid position: {position}ms (duration: {duration}ms)")]
    InvalidPosition { position: u64, duration: u64 },

    // ===== Persisted State Errors =====
    /// Stored record could not be decoded
    #[error("Stored state '{key}' is corrupted: {reason}")]
    CorruptedState { key: String, reason: String },

    /// Stored record could not be written
    #[error("Failed to save '{key}': {reason}")]
    StateWriteFailed { key: String, reason: String },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {setting} = '{value}' ({reason})")]
    InvalidConfiguration {
        setting: String,
        value: String,
        reason: String,
    },

    /// Configuration file corrupted
    #[error("Configuration corrupted: {path}")]
    ConfigurationCorrupted { path: PathBuf },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Generic Errors =====
    /// Generic internal error
    #[error("Internal error: {message}")]
    InternalError { message: String },

    /// Operation cancelled by user
    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CatalogUnavailable { .. }
            | Self::MediaError { .. }
            | Self::StateWriteFailed { .. } => ErrorSeverity::Recoverable,

            Self::CorruptedState { .. }
            | Self::NoPlayableAudio { .. }
            | Self::InvalidPosition { .. }
            | Self::InvalidArgument { .. }
            | Self::Cancelled { .. } => ErrorSeverity::Degraded,

            Self::CatalogRetriesExhausted { .. }
            | Self::InvalidCatalogResponse { .. }
            | Self::BookNotFound { .. }
            | Self::MediaLoadFailed { .. }
            | Self::ConfigurationCorrupted { .. }
            | Self::InvalidConfiguration { .. } => ErrorSeverity::Blocking,

            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::CatalogUnavailable { .. } => RecoveryAction::RetryWithBackoff,

            Self::MediaError { .. } => RecoveryAction::ScheduledReload,

            Self::CatalogRetriesExhausted { .. }
            | Self::InvalidCatalogResponse { .. }
            | Self::MediaLoadFailed { .. } => RecoveryAction::ManualReload,

            Self::BookNotFound { .. } | Self::NoPlayableAudio { .. } => {
                RecoveryAction::ReturnToCatalog
            }

            Self::CorruptedState { .. } => RecoveryAction::ResetState,

            Self::ConfigurationCorrupted { .. } => RecoveryAction::RestoreBackup,

            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly message suitable for display
    pub fn user_message(&self) -> String {
        match self {
            Self::CatalogUnavailable { .. } | Self::CatalogRetriesExhausted { .. } => {
                "Could not load the catalog. Check your connection and reload.".to_string()
            }
            Self::InvalidCatalogResponse { .. } => {
                "The catalog returned data that could not be read. Try reloading.".to_string()
            }
            Self::BookNotFound { .. } => {
                "Audiobook not found. It may have been removed from the catalog.".to_string()
            }

            Self::MediaError { .. } => "Audio interrupted. Reconnecting...".to_string(),
            Self::MediaLoadFailed { .. } => {
                "The audio could not be loaded. Press retry to try again.".to_string()
            }
            Self::NoPlayableAudio { .. } => {
                "This title has no audiobook version available.".to_string()
            }
            Self::InvalidPosition { .. } => "Cannot seek to that position.".to_string(),

            Self::CorruptedState { .. } => {
                "Some saved data was unreadable and has been reset.".to_string()
            }
            Self::StateWriteFailed { .. } => "Your progress could not be saved.".to_string(),

            Self::InvalidConfiguration { setting, .. } => {
                format!("Invalid setting: {}. Please check your configuration.", setting)
            }
            Self::ConfigurationCorrupted { .. } => {
                "Settings are corrupted. Resetting to defaults...".to_string()
            }

            Self::FileNotFound { .. } => "The file was not found.".to_string(),
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),

            Self::InternalError { .. } => {
                "An unexpected error occurred. Please try again.".to_string()
            }
            Self::Cancelled { .. } => "Operation was cancelled.".to_string(),
            Self::InvalidArgument { .. } => "Invalid input provided.".to_string(),
        }
    }

    /// Returns true if the current view cannot continue without the user
    pub fn is_blocking(&self) -> bool {
        self.severity() == ErrorSeverity::Blocking
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.recovery_action(),
            RecoveryAction::RetryWithBackoff | RecoveryAction::ScheduledReload
        )
    }

    /// Helper to create a catalog transport error from any error type
    pub fn catalog<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::CatalogUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}
