//! Handles shared by every command of one invocation

use anyhow::{Context, Result};
use audioteca_catalog::{Catalog, CatalogError, HttpCatalog, HttpCatalogConfig, LocalCatalog};
use audioteca_config::{Config, ConfigManager};
use audioteca_core::AppError;
use audioteca_resilience::RetryPolicy;
use audioteca_storage::ClientState;
use std::path::{Path, PathBuf};

pub struct AppContext {
    pub manager: ConfigManager,
    pub config: Config,
    data: Option<PathBuf>,
}

impl AppContext {
    pub fn new(manager: ConfigManager, config: Config, data: Option<PathBuf>) -> Self {
        Self {
            manager,
            config,
            data,
        }
    }

    /// Resolves the config directory and loads the config with env overrides
    ///
    /// A config that cannot be read falls back to defaults so the
    /// `config` subcommands stay usable.
    pub fn load(config_dir: Option<PathBuf>, data: Option<PathBuf>) -> Result<(Self, Option<String>)> {
        let manager = match config_dir {
            Some(dir) => ConfigManager::with_directory(dir),
            None => ConfigManager::new().context("Failed to locate the config directory")?,
        };

        let (config, warning) = match manager.load_with_env_overrides() {
            Ok(config) => (config, None),
            Err(e) => (
                Config::default(),
                Some(format!("{}; using default settings", e)),
            ),
        };

        Ok((Self::new(manager, config, data), warning))
    }

    /// Opens file-backed client state in the configured data directory
    pub fn state(&self) -> Result<ClientState> {
        let dir = ConfigManager::data_dir(&self.config).context("Failed to resolve data directory")?;
        ClientState::open(
            &dir,
            self.config.storage.max_resume_entries,
            self.config.storage.max_recent_books,
        )
        .with_context(|| format!("Failed to open client state in {}", dir.display()))
    }

    /// The offline catalog when `--data` was given, the HTTP backend otherwise
    pub async fn catalog(&self) -> Result<Box<dyn Catalog>> {
        match &self.data {
            Some(path) => {
                let catalog = LocalCatalog::open(path)
                    .await
                    .map_err(report)?
                    .with_media_base(media_base_for(path));
                Ok(Box::new(catalog))
            }
            None => {
                let settings = &self.config.catalog;
                let policy = RetryPolicy::new(settings.max_attempts as usize)
                    .with_initial_delay(std::time::Duration::from_millis(200))
                    .with_max_delay(std::time::Duration::from_secs(5));
                let config = HttpCatalogConfig::new(settings.base_url.clone())
                    .with_timeout(settings.timeout())
                    .with_retry_policy(policy);
                let catalog = HttpCatalog::new(config).map_err(report)?;
                Ok(Box::new(catalog))
            }
        }
    }

    pub fn per_page(&self) -> u32 {
        self.config.catalog.per_page
    }
}

/// Local media sits next to the catalog file
fn media_base_for(path: &Path) -> String {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    format!("file://{}", dir.display())
}

/// Converts a catalog failure into an error carrying the user-facing message
pub fn report(err: CatalogError) -> anyhow::Error {
    let app: AppError = err.into();
    let summary = format!("{} ({})", app.user_message(), app.recovery_action());
    anyhow::Error::new(app).context(summary)
}
