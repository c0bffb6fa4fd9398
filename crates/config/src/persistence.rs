//! Reading and writing the config file
//!
//! Writes are atomic (temp file then rename) and the previous file is kept
//! as `config.toml.backup`. Loading migrates old layouts and only warns about
//! invalid values so a hand-edited file never locks the user out.

use crate::{migration, Config, ConfigError, ConfigResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.config_path.with_extension("toml.backup")
    }

    /// Loads configuration from file
    ///
    /// A missing file yields the defaults. An empty or unparseable file is
    /// an error.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents =
            fs::read_to_string(&self.config_path).map_err(|e| ConfigError::ReadError {
                path: self.config_path.clone(),
                source: e,
            })?;

        // An empty file is treated as damaged rather than as "all defaults"
        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Config file is empty or contains only whitespace",
                ),
            });
        }

        let config = self.parse(&contents)?;

        if let Err(errors) = config.validate() {
            let error_msg = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            log::warn!("Config validation warnings: {}", error_msg);
        }

        Ok(config)
    }

    fn parse(&self, contents: &str) -> ConfigResult<Config> {
        let parse_error = |source| ConfigError::ParseError {
            path: self.config_path.clone(),
            source,
        };

        let mut table: toml::Table = toml::from_str(contents).map_err(parse_error)?;
        let migrated = migration::migrate_to_latest(&mut table)?;

        let config: Config = if migrated {
            let rewritten = toml::to_string(&table)?;
            toml::from_str(&rewritten).map_err(parse_error)?
        } else {
            toml::from_str(contents).map_err(parse_error)?
        };

        if migrated {
            log::info!("Saving migrated config");
            self.save(&config)?;
        }

        Ok(config)
    }

    /// Validates and saves configuration atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            let error_msg = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigError::ValidationError(error_msg));
        }

        if let Some(parent) = self.config_path.parent() {
            self.ensure_directory_exists(parent)?;
        }

        if self.config_path.exists() {
            self.backup_config()?;
        }

        let toml_string = toml::to_string_pretty(config)?;
        self.write_atomic(&toml_string)?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    /// Replaces the config file with its backup
    ///
    /// Returns false if there is no backup.
    pub fn restore_backup(&self) -> ConfigResult<bool> {
        let backup_path = self.backup_path();
        if !backup_path.exists() {
            return Ok(false);
        }

        let contents = fs::read_to_string(&backup_path).map_err(|e| ConfigError::ReadError {
            path: backup_path.clone(),
            source: e,
        })?;
        self.write_atomic(&contents)?;
        log::info!("Restored config from {}", backup_path.display());
        Ok(true)
    }

    fn ensure_directory_exists(&self, path: &Path) -> ConfigResult<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| ConfigError::DirectoryCreationError {
                path: path.to_path_buf(),
                source: e,
            })?;
            log::info!("Created config directory: {}", path.display());
        }
        Ok(())
    }

    fn backup_config(&self) -> ConfigResult<()> {
        let backup_path = self.backup_path();
        fs::copy(&self.config_path, &backup_path)
            .map_err(|e| ConfigError::BackupError { source: e })?;
        log::debug!("Backed up config to {}", backup_path.display());
        Ok(())
    }

    fn write_atomic(&self, content: &str) -> ConfigResult<()> {
        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Config path has no parent directory".to_string(),
            })?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(&self.config_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e.error,
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        (temp_dir, config_path)
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let config = persistence.load().expect("Should load default config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.player.max_load_failures = 4;
        config.catalog.base_url = "https://books.example.org".to_string();

        persistence.save(&config).expect("Should save config");
        let loaded = persistence.load().expect("Should load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("subdir").join("config.toml");
        let persistence = ConfigPersistence::new(config_path.clone());

        persistence
            .save(&Config::default())
            .expect("Should create directory and save");

        assert!(config_path.exists());
    }

    #[test]
    fn test_backup_created_on_overwrite() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        persistence.save(&Config::default()).expect("Should save config");
        persistence.save(&Config::default()).expect("Should save config again");

        assert!(persistence.backup_path().exists());
    }

    #[test]
    fn test_restore_backup() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path.clone());
        assert!(!persistence.restore_backup().expect("Should not fail"));

        let mut first = Config::default();
        first.player.autoplay = false;
        persistence.save(&first).expect("Should save");
        persistence.save(&Config::default()).expect("Should save");

        fs::write(&config_path, "broken = [").expect("Should write");
        assert!(persistence.restore_backup().expect("Should restore"));

        let loaded = persistence.load().expect("Should load restored config");
        assert!(!loaded.player.autoplay);
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "this is not valid TOML {{{").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_empty_file_is_error() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "  \n").expect("Should write file");

        let result = ConfigPersistence::new(config_path).load();
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_validate_before_save() {
        let (_temp_dir, config_path) = setup_test_dir();
        let persistence = ConfigPersistence::new(config_path);

        let mut config = Config::default();
        config.catalog.per_page = 500;

        let result = persistence.save(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_values_load_with_warning() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(&config_path, "[player]\nmax_load_failures = 99\n").expect("Should write");

        let config = ConfigPersistence::new(config_path)
            .load()
            .expect("Should load despite invalid value");
        assert_eq!(config.player.max_load_failures, 99);
    }

    #[test]
    fn test_old_layout_is_migrated_and_saved() {
        let (_temp_dir, config_path) = setup_test_dir();
        fs::write(
            &config_path,
            "version = 0\n[app]\ncatalog_url = \"https://books.example.org\"\n",
        )
        .expect("Should write");

        let persistence = ConfigPersistence::new(config_path.clone());
        let config = persistence.load().expect("Should migrate");
        assert_eq!(config.catalog.base_url, "https://books.example.org");
        assert_eq!(config.version, crate::CONFIG_VERSION);

        let on_disk = fs::read_to_string(&config_path).expect("Should read");
        assert!(!on_disk.contains("catalog_url"));
    }
}
