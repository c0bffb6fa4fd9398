//! Error types for client state storage

use audioteca_core::AppError;
use audioteca_resilience::ResilienceError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while reading or writing stored state
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to read a stored value
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a stored value
    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create the storage directory
    #[error("Failed to create storage directory {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that cannot name a file
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    /// Stored value could not be decoded
    #[error("Corrupted record '{key}': {reason}")]
    Corrupted { key: String, reason: String },

    /// Value could not be encoded
    #[error("Failed to serialize '{key}': {source}")]
    SerializeError {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Atomic replace kept failing
    #[error("Atomic write failed: {0}")]
    Persist(#[from] ResilienceError),

    /// Generic I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Corrupted { key, reason } => AppError::CorruptedState { key, reason },
            StorageError::InvalidKey(key) => AppError::InvalidArgument {
                argument: "key".to_string(),
                reason: format!("'{}' is not a valid storage key", key),
            },
            StorageError::SerializeError { key, source } => AppError::StateWriteFailed {
                key,
                reason: source.to_string(),
            },
            StorageError::WriteError { path, source } => AppError::StateWriteFailed {
                key: path.display().to_string(),
                reason: source.to_string(),
            },
            StorageError::IoError(source) => source.into(),
            other => AppError::InternalError {
                message: other.to_string(),
            },
        }
    }
}
