//! Error types for catalog access

use audioteca_core::{AppError, BookId};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no entry with this id
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// Non-success HTTP status other than a missing book
    #[error("Catalog returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Transient failures persisted past the retry policy
    #[error("Catalog request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: usize, message: String },

    /// No playable media is known for this download id
    #[error("No media available for {0}")]
    MediaUnavailable(String),

    /// Response body did not match the expected shape
    #[error("Invalid catalog response: {0}")]
    Decode(String),

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid retry policy: {0}")]
    Policy(#[from] audioteca_resilience::ResilienceError),

    #[error("Failed to read catalog file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CatalogError {
    /// Transport failures and 5xx responses are worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Http(e) => !e.is_decode() && !e.is_builder(),
            CatalogError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::BookNotFound(id) => AppError::BookNotFound {
                id: id.to_string(),
            },
            CatalogError::RetriesExhausted { attempts, message } => {
                AppError::CatalogRetriesExhausted {
                    attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
                    message,
                }
            }
            CatalogError::Decode(details) => AppError::InvalidCatalogResponse { details },
            CatalogError::MediaUnavailable(id) => AppError::NoPlayableAudio { id },
            CatalogError::Http(e) => AppError::catalog("Catalog request failed", e),
            CatalogError::Io { path, source } => AppError::IoError {
                message: format!("Failed to read catalog file at {}", path.display()),
                source,
            },
            other => AppError::CatalogUnavailable {
                message: other.to_string(),
                source: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioteca_core::RecoveryAction;

    #[test]
    fn test_retryable_statuses() {
        let server = CatalogError::Status {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        let client = CatalogError::Status {
            status: 400,
            message: "Bad Request".to_string(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!CatalogError::BookNotFound(BookId::new("x")).is_retryable());
        assert!(!CatalogError::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn test_not_found_maps_to_app_error() {
        let app: AppError = CatalogError::BookNotFound(BookId::new("b1")).into();
        assert!(matches!(app, AppError::BookNotFound { ref id } if id == "b1"));
        assert_eq!(app.recovery_action(), RecoveryAction::ReturnToCatalog);
    }

    #[test]
    fn test_exhausted_maps_to_manual_reload() {
        let app: AppError = CatalogError::RetriesExhausted {
            attempts: 3,
            message: "HTTP 502".to_string(),
        }
        .into();
        assert!(matches!(
            app,
            AppError::CatalogRetriesExhausted { attempts: 3, .. }
        ));
        assert_eq!(app.recovery_action(), RecoveryAction::ManualReload);
    }
}
