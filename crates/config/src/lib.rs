//! Audioteca configuration
//!
//! A single TOML file holds one table per [`ConfigSection`]. Missing keys take
//! their defaults, invalid values are reported but still loaded, and files
//! are always written atomically with the previous version kept as a backup.
//!
//! ```rust,no_run
//! use audioteca_config::{Config, ConfigManager};
//!
//! let config = ConfigManager::new()
//!     .map(|manager| manager.load_or_default())
//!     .unwrap_or_default();
//!
//! println!("Catalog: {}", config.catalog.base_url);
//! ```

mod error;
mod manager;
mod migration;
mod persistence;
mod validation;

mod app_config;
mod catalog_config;
mod player_config;
mod storage_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_env_overrides, ConfigManager, ENV_PREFIX};
pub use validation::{ConfigSection, Validator};

pub use app_config::{AppConfig, LogLevel};
pub use catalog_config::CatalogConfig;
pub use player_config::PlayerConfig;
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version for migrations
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,
    pub app: AppConfig,
    pub player: PlayerConfig,
    pub catalog: CatalogConfig,
    pub storage: StorageConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut e) = self.app.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.player.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.catalog.validate() {
            errors.append(&mut e);
        }
        if let Err(mut e) = self.storage.validate() {
            errors.append(&mut e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Merges `other` over this config (defaults < file < env < CLI)
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.player.merge(other.player);
        self.catalog.merge(other.catalog);
        self.storage.merge(other.storage);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            player: PlayerConfig::default(),
            catalog: CatalogConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}
