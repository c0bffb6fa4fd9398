//! Upgrades of older config file layouts
//!
//! Migrations run on the raw TOML table before it is deserialized, so a
//! migration can rename or reshape keys the current `Config` no longer knows.

use crate::{ConfigResult, CONFIG_VERSION};
use toml::Table;

/// One step from `target_version() - 1` to `target_version()`
pub trait Migration {
    fn target_version(&self) -> u32;

    fn migrate(&self, table: &mut Table) -> ConfigResult<()>;
}

/// Reads the `version` key, treating a missing key as current
pub fn file_version(table: &Table) -> u32 {
    table
        .get("version")
        .and_then(|v| v.as_integer())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(CONFIG_VERSION)
}

/// Applies every migration between the table's version and the current one
///
/// Returns true if the table was changed.
pub fn migrate_to_latest(table: &mut Table) -> ConfigResult<bool> {
    let version = file_version(table);

    if version == CONFIG_VERSION {
        return Ok(false);
    }

    if version > CONFIG_VERSION {
        log::warn!(
            "Config version {} is newer than supported version {}. Attempting to use as-is.",
            version,
            CONFIG_VERSION
        );
        return Ok(false);
    }

    log::info!("Migrating config from version {} to {}", version, CONFIG_VERSION);

    for next_version in (version + 1)..=CONFIG_VERSION {
        match get_migration(next_version) {
            Some(migration) => {
                migration.migrate(table)?;
                log::info!("Applied migration to version {}", migration.target_version());
            }
            None => log::warn!("No migration defined for version {}, skipping", next_version),
        }
    }

    table.insert(
        "version".to_string(),
        toml::Value::Integer(i64::from(CONFIG_VERSION)),
    );
    Ok(true)
}

/// Layouts before version 1 kept the catalog URL and page size under `[app]`
struct MoveCatalogKeys;

impl Migration for MoveCatalogKeys {
    fn target_version(&self) -> u32 {
        1
    }

    fn migrate(&self, table: &mut Table) -> ConfigResult<()> {
        let Some(app) = table.get_mut("app").and_then(|v| v.as_table_mut()) else {
            return Ok(());
        };

        let mut moved = Table::new();
        if let Some(url) = app.remove("catalog_url") {
            moved.insert("base_url".to_string(), url);
        }
        if let Some(per_page) = app.remove("per_page") {
            moved.insert("per_page".to_string(), per_page);
        }
        if moved.is_empty() {
            return Ok(());
        }

        let catalog = table
            .entry("catalog")
            .or_insert_with(|| toml::Value::Table(Table::new()));
        if let Some(catalog) = catalog.as_table_mut() {
            for (key, value) in moved {
                catalog.entry(key).or_insert(value);
            }
        }
        Ok(())
    }
}

fn get_migration(version: u32) -> Option<Box<dyn Migration>> {
    match version {
        1 => Some(Box::new(MoveCatalogKeys)),
        _ => None,
    }
}
