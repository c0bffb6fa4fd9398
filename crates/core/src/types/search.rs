//! Catalog search filters

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Field a catalog query is matched against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    All,
    Title,
    Author,
    Narrator,
    Genre,
}

impl SearchType {
    /// Value used for the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Title => "title",
            Self::Author => "author",
            Self::Narrator => "narrator",
            Self::Genre => "genre",
        }
    }
}

impl std::fmt::Display for SearchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "narrator" => Ok(Self::Narrator),
            "genre" => Ok(Self::Genre),
            other => Err(format!(
                "Unknown search type '{}' (expected all, title, author, narrator or genre)",
                other
            )),
        }
    }
}

/// Query text plus the field it applies to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub query: String,
    #[serde(rename = "type")]
    pub kind: SearchType,
}

impl SearchFilters {
    pub fn new(query: impl Into<String>, kind: SearchType) -> Self {
        Self {
            query: query.into(),
            kind,
        }
    }

    /// Returns true if the query has no searchable text
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_type_parse() {
        assert_eq!("Author".parse::<SearchType>().unwrap(), SearchType::Author);
        assert_eq!("".parse::<SearchType>().unwrap(), SearchType::All);
        assert!("publisher".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_search_type_as_str_roundtrips() {
        for kind in [
            SearchType::All,
            SearchType::Title,
            SearchType::Author,
            SearchType::Narrator,
            SearchType::Genre,
        ] {
            assert_eq!(kind.as_str().parse::<SearchType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_filters_empty() {
        assert!(SearchFilters::default().is_empty());
        assert!(SearchFilters::new("  ", SearchType::Title).is_empty());
        assert!(!SearchFilters::new("quijote", SearchType::All).is_empty());
    }
}
