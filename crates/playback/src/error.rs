// FILE: crates/playback/src/error.rs

use audioteca_core::AppError;
use audioteca_resilience::ResilienceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Invalid volume: {0} (must be between 0 and 1)")]
    InvalidVolume(f32),

    #[error("Invalid speed: {0}")]
    InvalidSpeed(f32),

    #[error("Chapter {index} out of range (book has {count} chapters)")]
    ChapterOutOfRange { index: usize, count: usize },

    #[error("This audio has no chapters")]
    NoChapters,

    #[error("Invalid sleep timer: {0} minutes")]
    InvalidTimer(u32),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Media failed to load after {0} attempts")]
    LoadFailed(usize),

    #[error("Invalid reload policy: {0}")]
    Policy(#[from] ResilienceError),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;

impl From<PlaybackError> for AppError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::InvalidVolume(v) => AppError::InvalidArgument {
                argument: "volume".to_string(),
                reason: format!("{} is outside 0..=1", v),
            },
            PlaybackError::InvalidSpeed(s) => AppError::InvalidArgument {
                argument: "speed".to_string(),
                reason: format!("{} is not a supported speed", s),
            },
            PlaybackError::ChapterOutOfRange { index, count } => AppError::InvalidArgument {
                argument: "chapter".to_string(),
                reason: format!("{} is outside 1..={}", index + 1, count),
            },
            PlaybackError::NoChapters => AppError::InvalidArgument {
                argument: "chapter".to_string(),
                reason: "this audio has no chapters".to_string(),
            },
            PlaybackError::InvalidTimer(m) => AppError::InvalidArgument {
                argument: "sleep".to_string(),
                reason: format!("{} minutes", m),
            },
            PlaybackError::Media(message) => AppError::MediaError { message },
            PlaybackError::LoadFailed(attempts) => AppError::MediaLoadFailed {
                attempts: attempts as u32,
            },
            PlaybackError::Policy(e) => AppError::InvalidConfiguration {
                setting: "player.max_load_failures".to_string(),
                value: String::new(),
                reason: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audioteca_core::RecoveryAction;

    #[test]
    fn test_error_display() {
        let err = PlaybackError::ChapterOutOfRange { index: 7, count: 3 };
        assert!(err.to_string().contains("7"));
        assert!(err.to_string().contains("3"));
    }

    #[test]
    fn test_load_failed_maps_to_manual_reload() {
        let app: AppError = PlaybackError::LoadFailed(10).into();
        assert_eq!(app.recovery_action(), RecoveryAction::ManualReload);
    }

    #[test]
    fn test_media_error_maps_to_scheduled_reload() {
        let app: AppError = PlaybackError::Media("decode".to_string()).into();
        assert_eq!(app.recovery_action(), RecoveryAction::ScheduledReload);
    }
}
