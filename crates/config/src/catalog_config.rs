//! Catalog backend configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};

/// Where and how the catalog is queried
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root URL of the catalog API
    pub base_url: String,

    /// Results per catalog page
    pub per_page: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per request before giving up on transient failures
    pub max_attempts: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8787".to_string(),
            per_page: 20,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigSection for CatalogConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::http_url(&self.base_url, "catalog.base_url"),
            Validator::in_range(self.per_page, 1, 100, "catalog.per_page"),
            Validator::in_range(self.timeout_secs, 1, 300, "catalog.timeout_secs"),
            Validator::in_range(self.max_attempts, 1, 10, "catalog.max_attempts"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.per_page = other.per_page;
        self.timeout_secs = other.timeout_secs;
        self.max_attempts = other.max_attempts;
    }

    fn section_name(&self) -> &'static str {
        "catalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CatalogConfig::default().validate().is_ok());
    }

    #[test]
    fn test_per_page_bounds() {
        let mut config = CatalogConfig::default();
        config.per_page = 0;
        assert!(config.validate().is_err());
        config.per_page = 101;
        assert!(config.validate().is_err());
        config.per_page = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let config = CatalogConfig {
            base_url: "localhost".to_string(),
            ..Default::default()
        };
        let errors = config.validate().expect_err("Should be invalid");
        assert_eq!(errors[0].field, "catalog.base_url");
    }
}
