//! The catalog seam shared by the HTTP and offline backends

use crate::error::CatalogResult;
use crate::pagination::CatalogPage;
use async_trait::async_trait;
use audioteca_core::{Book, BookId, SearchFilters};

/// Query interface of an audiobook catalog
#[async_trait]
pub trait Catalog: Send + Sync {
    /// One page of books matching `filters`; `page` is 1-based
    async fn search(
        &self,
        filters: &SearchFilters,
        page: u32,
        per_page: u32,
    ) -> CatalogResult<CatalogPage>;

    /// Full record of one book, `CatalogError::BookNotFound` if absent
    async fn book(&self, id: &BookId) -> CatalogResult<Book>;

    /// Playable media URL for a book's download id
    async fn media_url(&self, download_id: &str) -> CatalogResult<String>;
}
