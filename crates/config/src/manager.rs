//! Configuration manager - main API for config operations

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "audioteca";

/// Prefix of environment overrides, e.g. `AUDIOTECA_CATALOG_BASE_URL`
pub const ENV_PREFIX: &str = "AUDIOTECA";

/// Main configuration manager
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for the platform config directory
    ///
    /// - Linux: `~/.config/audioteca/`
    /// - macOS: `~/Library/Application Support/audioteca/`
    /// - Windows: `%APPDATA%\audioteca\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Ok(Self::with_directory(config_dir))
    }

    pub fn with_directory(config_dir: PathBuf) -> Self {
        let persistence = ConfigPersistence::new(config_dir.join("config.toml"));
        Self {
            persistence,
            config_dir,
        }
    }

    fn project_dirs() -> ConfigResult<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME).ok_or_else(|| ConfigError::PathResolutionError {
            reason: "Could not determine user home directory".to_string(),
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    /// Directory for client state: the configured override or the platform data dir
    pub fn data_dir(config: &Config) -> ConfigResult<PathBuf> {
        match &config.app.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Loads the configuration; a missing file yields defaults
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Validates and atomically saves the configuration
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Loads, applies `update_fn` and saves
    ///
    /// ```rust,no_run
    /// # use audioteca_config::ConfigManager;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ConfigManager::new()?;
    /// manager.update(|config| {
    ///     config.player.max_load_failures = 5;
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a default config file if none exists
    ///
    /// Returns Ok(true) if a new file was created.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        log::info!("Generated default config at {}", self.config_path().display());
        Ok(true)
    }

    /// Overwrites the config file with defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Puts the previous config file back in place
    pub fn restore_backup(&self) -> ConfigResult<bool> {
        self.persistence.restore_backup()
    }

    /// Returns every validation problem in the current file
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the file and applies `AUDIOTECA_<SECTION>_<FIELD>` overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        Ok(config)
    }
}

/// Applies environment overrides read through `lookup`
///
/// Values that do not parse are ignored with a warning.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |section: &str, field: &str| {
        let name = format!("{}_{}_{}", ENV_PREFIX, section, field);
        lookup(&name).map(|value| (name, value))
    };

    fn parsed<T: std::str::FromStr>(entry: Option<(String, String)>) -> Option<T> {
        let (name, value) = entry?;
        match value.trim().parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring {}={}: not a valid value", name, value);
                None
            }
        }
    }

    if let Some((_, url)) = var("CATALOG", "BASE_URL") {
        config.catalog.base_url = url;
    }
    if let Some(per_page) = parsed(var("CATALOG", "PER_PAGE")) {
        config.catalog.per_page = per_page;
    }
    if let Some(volume) = parsed(var("PLAYER", "DEFAULT_VOLUME")) {
        config.player.default_volume = volume;
    }
    if let Some(speed) = parsed(var("PLAYER", "DEFAULT_SPEED")) {
        config.player.default_speed = speed;
    }
    if let Some(failures) = parsed(var("PLAYER", "MAX_LOAD_FAILURES")) {
        config.player.max_load_failures = failures;
    }
    if let Some(level) = parsed::<LogLevel>(var("APP", "LOG_LEVEL")) {
        config.app.log_level = level;
    }
    if let Some((_, dir)) = var("APP", "DATA_DIR") {
        config.app.data_dir = Some(PathBuf::from(dir));
    }

    if let Err(errors) = config.validate() {
        log::warn!(
            "Config validation warnings after env overrides: {}",
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf());
        (temp_dir, manager)
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupted_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[[[").expect("Should write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_update() {
        let (_temp_dir, manager) = setup_test_manager();

        manager
            .update(|config| {
                config.player.retry_delay_ms = 2500;
            })
            .expect("Should update");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.player.retry_delay_ms, 2500);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.storage.max_recent_books = 2;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");
        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_validate_reports_hand_edited_errors() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[catalog]\nper_page = 0\n").expect("Should write");

        let errors = manager.validate().expect("Should validate");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("catalog.per_page"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("AUDIOTECA_CATALOG_BASE_URL", "https://books.example.org"),
                ("AUDIOTECA_PLAYER_DEFAULT_VOLUME", "0.5"),
                ("AUDIOTECA_PLAYER_DEFAULT_SPEED", "1.25"),
                ("AUDIOTECA_PLAYER_MAX_LOAD_FAILURES", "3"),
                ("AUDIOTECA_APP_LOG_LEVEL", "debug"),
                ("AUDIOTECA_APP_DATA_DIR", "/srv/audioteca"),
            ]),
        );

        assert_eq!(config.catalog.base_url, "https://books.example.org");
        assert_eq!(config.player.default_volume, 0.5);
        assert_eq!(config.player.default_speed, 1.25);
        assert_eq!(config.player.max_load_failures, 3);
        assert_eq!(config.app.log_level, LogLevel::Debug);
        assert_eq!(config.app.data_dir, Some(PathBuf::from("/srv/audioteca")));
    }

    #[test]
    fn test_unparseable_env_override_ignored() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[("AUDIOTECA_PLAYER_MAX_LOAD_FAILURES", "lots")]),
        );
        assert_eq!(config.player.max_load_failures, 10);
    }

    #[test]
    fn test_data_dir_override() {
        let mut config = Config::default();
        config.app.data_dir = Some(PathBuf::from("/tmp/audioteca-data"));
        assert_eq!(
            ConfigManager::data_dir(&config).expect("Should resolve"),
            PathBuf::from("/tmp/audioteca-data")
        );
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}
