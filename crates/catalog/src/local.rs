//! Offline catalog served from a consolidated JSON file

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};
use crate::pagination::{CatalogPage, Pagination};
use crate::search::{matches_field, terms, SearchIndex};
use crate::wire::{books_from_map, WireBookMap};
use async_trait::async_trait;
use audioteca_core::{Book, BookId, SearchFilters};
use std::collections::BTreeMap;
use std::path::Path;

/// In-memory catalog with the same query semantics as the backend
#[derive(Debug)]
pub struct LocalCatalog {
    books: BTreeMap<BookId, Book>,
    index: SearchIndex,
    media_base: Option<String>,
}

impl LocalCatalog {
    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books: BTreeMap<BookId, Book> = books.into_iter().map(|b| (b.id.clone(), b)).collect();
        let index = SearchIndex::build(books.values());
        log::debug!(
            "Indexed {} books ({} terms)",
            books.len(),
            index.term_count()
        );
        Self {
            books,
            index,
            media_base: None,
        }
    }

    /// Parses a `{ "<id>": { ...book... } }` document
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let map: WireBookMap =
            serde_json::from_str(json).map_err(|e| CatalogError::Decode(e.to_string()))?;
        Ok(Self::from_books(books_from_map(map)))
    }

    pub async fn open(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CatalogError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        let catalog = Self::from_json(&json)?;
        log::info!(
            "Loaded {} books from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Media URLs become `<base>/<download id>`
    pub fn with_media_base(mut self, base: impl Into<String>) -> Self {
        self.media_base = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Ids matching `filters`, ordered by id
    pub fn matching_ids(&self, filters: &SearchFilters) -> Vec<BookId> {
        if filters.is_empty() {
            return self.books.keys().cloned().collect();
        }
        if terms(&filters.query).is_empty() {
            return Vec::new();
        }

        self.index
            .matching(&filters.query)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| {
                self.books
                    .get(id)
                    .is_some_and(|book| matches_field(book, filters))
            })
            .collect()
    }
}

#[async_trait]
impl Catalog for LocalCatalog {
    async fn search(
        &self,
        filters: &SearchFilters,
        page: u32,
        per_page: u32,
    ) -> CatalogResult<CatalogPage> {
        let ids = self.matching_ids(filters);
        let pagination = Pagination::new(ids.len(), per_page.clamp(1, 100), page);
        let books = ids[pagination.range()]
            .iter()
            .filter_map(|id| self.books.get(id).cloned())
            .collect();
        Ok(CatalogPage { books, pagination })
    }

    async fn book(&self, id: &BookId) -> CatalogResult<Book> {
        self.books
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::BookNotFound(id.clone()))
    }

    async fn media_url(&self, download_id: &str) -> CatalogResult<String> {
        match &self.media_base {
            Some(base) => Ok(format!("{}/{}", base, download_id)),
            None => Err(CatalogError::MediaUnavailable(download_id.to_string())),
        }
    }
}
