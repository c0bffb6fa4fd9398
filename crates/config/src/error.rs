//! Error types for the configuration system

use audioteca_core::AppError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur during configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file at {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Config contains invalid values
    #[error("Config validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to create config directory at {path}: {source}")]
    DirectoryCreationError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Platform directories could not be determined
    #[error("Could not determine config directory path: {reason}")]
    PathResolutionError { reason: String },

    #[error("Failed to backup config file: {source}")]
    BackupError { source: std::io::Error },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ParseError { path, .. } => AppError::ConfigurationCorrupted { path },
            ConfigError::ValidationError(reason) => AppError::InvalidConfiguration {
                setting: "config".to_string(),
                value: String::new(),
                reason,
            },
            ConfigError::ReadError { path, source }
            | ConfigError::WriteError { path, source }
            | ConfigError::DirectoryCreationError { path, source } => {
                if source.kind() == std::io::ErrorKind::NotFound {
                    AppError::FileNotFound { path }
                } else {
                    AppError::IoError {
                        message: format!("{}: {}", path.display(), source),
                        source,
                    }
                }
            }
            ConfigError::IoError(source) | ConfigError::BackupError { source } => {
                AppError::IoError {
                    message: source.to_string(),
                    source,
                }
            }
            other => AppError::InternalError {
                message: other.to_string(),
            },
        }
    }
}

/// Validation error for a specific config field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Path to the field (e.g., "player.default_volume")
    pub field: String,
    pub message: String,
    /// The invalid value, if available
    pub value: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: None,
        }
    }

    /// Creates a validation error with the invalid value
    pub fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value: Some(value.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Field '{}': {}", self.field, self.message)?;
        if let Some(ref value) = self.value {
            write!(f, " (got: {})", value)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("player.max_load_failures", "must be between 1 and 20");
        assert_eq!(
            err.to_string(),
            "Field 'player.max_load_failures': must be between 1 and 20"
        );
    }

    #[test]
    fn test_validation_error_with_value() {
        let err = ValidationError::with_value("catalog.per_page", "must be between 1 and 100", 0);
        assert_eq!(
            err.to_string(),
            "Field 'catalog.per_page': must be between 1 and 100 (got: 0)"
        );
    }

    #[test]
    fn test_parse_error_maps_to_corrupted() {
        let source = toml::from_str::<toml::Table>("not = [valid").expect_err("Should fail");
        let err = ConfigError::ParseError {
            path: PathBuf::from("/tmp/config.toml"),
            source,
        };
        let app: AppError = err.into();
        assert!(matches!(app, AppError::ConfigurationCorrupted { .. }));
    }
}
