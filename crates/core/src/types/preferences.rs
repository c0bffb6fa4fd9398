//! User interface preferences

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Colour theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Darker,
    Sepia,
}

impl Theme {
    /// All themes in menu order
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Dark, Theme::Darker, Theme::Sepia];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Darker => "darker",
            Self::Sepia => "sepia",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown theme '{}'", s))
    }
}
