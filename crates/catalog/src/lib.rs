//! Audiobook catalog access
//!
//! [`Catalog`] is implemented by [`HttpCatalog`], which talks to the REST
//! backend, and by [`LocalCatalog`], which serves a consolidated JSON file
//! with the same search and pagination rules.

mod catalog;
mod error;
mod http;
mod local;
mod pagination;
pub mod search;
pub mod wire;

pub use catalog::Catalog;
pub use error::{CatalogError, CatalogResult};
pub use http::{HttpCatalog, HttpCatalogConfig};
pub use local::LocalCatalog;
pub use pagination::{page_numbers, CatalogPage, PageItem, Pagination, PAGE_WINDOW};
