//! Playback-related domain models

use serde::{Deserialize, Serialize};

/// Playback rates offered to the listener
pub const SUPPORTED_SPEEDS: [f32; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Playback speed restricted to the supported set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct PlaybackSpeed(f32);

impl PlaybackSpeed {
    /// Normal speed
    pub const NORMAL: Self = Self(1.0);

    /// Creates a playback speed, rejecting values outside the supported set
    pub fn new(speed: f32) -> Result<Self, String> {
        SUPPORTED_SPEEDS
            .iter()
            .find(|s| (**s - speed).abs() < f32::EPSILON)
            .map(|s| Self(*s))
            .ok_or_else(|| {
                format!(
                    "Speed {} is not one of {}",
                    speed,
                    SUPPORTED_SPEEDS
                        .iter()
                        .map(|s| s.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }

    /// Returns the speed value
    pub fn value(&self) -> f32 {
        self.0
    }

    /// All supported speeds in ascending order
    pub fn all() -> impl Iterator<Item = PlaybackSpeed> {
        SUPPORTED_SPEEDS.iter().map(|s| Self(*s))
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f32> for PlaybackSpeed {
    type Error = String;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlaybackSpeed> for f32 {
    fn from(speed: PlaybackSpeed) -> f32 {
        speed.0
    }
}

impl std::fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// Output volume in the range [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Volume(f32);

impl Volume {
    pub const MUTE: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    /// Creates a volume, rejecting values outside [0, 1]
    pub fn new(volume: f32) -> Result<Self, String> {
        if volume.is_finite() && (0.0..=1.0).contains(&volume) {
            Ok(Self(volume))
        } else {
            Err(format!("Volume {} must be between 0 and 1", volume))
        }
    }

    /// Returns the volume value
    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<f32> for Volume {
    type Error = String;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Volume> for f32 {
    fn from(volume: Volume) -> f32 {
        volume.0
    }
}
