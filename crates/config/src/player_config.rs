//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use audioteca_core::{Duration, SUPPORTED_SPEEDS};
use serde::{Deserialize, Serialize};

/// Player preferences and reload behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial volume (0.0 - 1.0)
    pub default_volume: f32,

    /// Initial playback speed, one of the supported steps
    pub default_speed: f32,

    /// How often the resume position is written, in seconds
    pub autosave_interval_secs: u64,

    /// Consecutive load failures before giving up
    pub max_load_failures: u32,

    /// Delay between automatic reloads in milliseconds
    pub retry_delay_ms: u64,

    /// Sleep timer choices in minutes
    pub sleep_timer_presets: Vec<u32>,

    /// Start playing as soon as a book is loaded
    pub autoplay: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            default_speed: 1.0,
            autosave_interval_secs: 5,
            max_load_failures: 10,
            retry_delay_ms: 1000,
            sleep_timer_presets: vec![15, 30, 45, 60, 90, 120],
            autoplay: true,
        }
    }
}

impl PlayerConfig {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_seconds(self.autosave_interval_secs)
    }

    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_delay_ms)
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.default_volume, 0.0, 1.0, "player.default_volume"),
            Validator::one_of(
                &self.default_speed,
                &SUPPORTED_SPEEDS,
                "player.default_speed",
            ),
            Validator::in_range(
                self.autosave_interval_secs,
                1,
                300,
                "player.autosave_interval_secs",
            ),
            Validator::in_range(self.max_load_failures, 1, 20, "player.max_load_failures"),
            Validator::in_range(self.retry_delay_ms, 100, 10_000, "player.retry_delay_ms"),
        ];

        if self.sleep_timer_presets.is_empty() {
            results.push(Err(ValidationError::new(
                "player.sleep_timer_presets",
                "must not be empty",
            )));
        }
        for minutes in &self.sleep_timer_presets {
            results.push(Validator::in_range(
                *minutes,
                1,
                720,
                "player.sleep_timer_presets",
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.default_volume = other.default_volume;
        self.default_speed = other.default_speed;
        self.autosave_interval_secs = other.autosave_interval_secs;
        self.max_load_failures = other.max_load_failures;
        self.retry_delay_ms = other.retry_delay_ms;
        self.sleep_timer_presets = other.sleep_timer_presets;
        self.autoplay = other.autoplay;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_load_failures, 10);
        assert_eq!(config.retry_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_volume() {
        let config = PlayerConfig {
            default_volume: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_speed_must_be_a_supported_step() {
        let mut config = PlayerConfig::default();
        config.default_speed = 1.75;
        assert!(config.validate().is_ok());

        config.default_speed = 1.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_bounds() {
        let mut config = PlayerConfig::default();
        config.max_load_failures = 0;
        assert!(config.validate().is_err());

        config.max_load_failures = 20;
        config.retry_delay_ms = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_validated() {
        let mut config = PlayerConfig::default();
        config.sleep_timer_presets = Vec::new();
        assert!(config.validate().is_err());

        config.sleep_timer_presets = vec![10, 0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = PlayerConfig {
            default_volume: -1.0,
            default_speed: 3.0,
            autosave_interval_secs: 0,
            ..Default::default()
        };

        let errors = config.validate().expect_err("Should be invalid");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_merge() {
        let mut base = PlayerConfig::default();
        let other = PlayerConfig {
            default_speed: 1.5,
            autoplay: false,
            ..Default::default()
        };

        base.merge(other);
        assert_eq!(base.default_speed, 1.5);
        assert!(!base.autoplay);
    }

    #[test]
    fn test_intervals() {
        let config = PlayerConfig::default();
        assert_eq!(config.autosave_interval(), Duration::from_seconds(5));
        assert_eq!(config.retry_delay(), std::time::Duration::from_millis(1000));
    }
}
