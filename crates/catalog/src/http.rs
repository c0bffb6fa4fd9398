//! Catalog client for the REST backend

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};
use crate::pagination::{CatalogPage, Pagination};
use crate::wire::{books_from_map, WireAudiobook, WireListResponse, WireRedirect};
use async_trait::async_trait;
use audioteca_core::{Book, BookId, SearchFilters};
use audioteca_resilience::{with_retry_async, RetryPolicy};
use reqwest::{Client as ReqwestClient, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpCatalogConfig {
    /// Root URL of the API, without the `/api` prefix
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// Applied to transport errors and 5xx responses only
    pub retry_policy: RetryPolicy,
}

impl HttpCatalogConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            user_agent: format!("Audioteca/{}", env!("CARGO_PKG_VERSION")),
            retry_policy: RetryPolicy::new(3).with_initial_delay(Duration::from_millis(100)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

/// [`Catalog`] backed by the REST API
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    inner: ReqwestClient,
    base: Url,
    retry_policy: RetryPolicy,
}

impl HttpCatalog {
    pub fn new(config: HttpCatalogConfig) -> CatalogResult<Self> {
        let base = Url::parse(config.base_url.trim())
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") || base.cannot_be_a_base() {
            return Err(CatalogError::InvalidUrl(format!(
                "{} must start with http:// or https://",
                config.base_url
            )));
        }

        config.retry_policy.validate()?;

        let inner = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            inner,
            base,
            retry_policy: config.retry_policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends percent-encoded path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> CatalogResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, url: Url, missing: Option<&BookId>) -> CatalogResult<String> {
        log::debug!("GET {}", url);
        let response = self.inner.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.text().await?);
        }

        if status == StatusCode::NOT_FOUND {
            if let Some(id) = missing {
                return Err(CatalogError::BookNotFound(id.clone()));
            }
        }

        Err(CatalogError::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }

    /// GETs and decodes `url`, retrying transient failures
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        missing: Option<&BookId>,
    ) -> CatalogResult<T> {
        let result = with_retry_async(&self.retry_policy, CatalogError::is_retryable, || {
            self.send(url.clone(), missing)
        })
        .await;

        let body = match result {
            Ok(body) => body,
            Err(e) if e.is_retryable() => {
                log::warn!("Giving up on {}: {}", url, e);
                return Err(CatalogError::RetriesExhausted {
                    attempts: self.retry_policy.max_attempts(),
                    message: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        serde_json::from_str(&body).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Catalog for HttpCatalog {
    async fn search(
        &self,
        filters: &SearchFilters,
        page: u32,
        per_page: u32,
    ) -> CatalogResult<CatalogPage> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut url = self.endpoint(&["api", "audiobooks"])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("page", &page.to_string())
                .append_pair("per_page", &per_page.to_string())
                .append_pair("type", filters.kind.as_str());
            if !filters.is_empty() {
                query.append_pair("query", filters.query.trim());
            }
        }

        let response: WireListResponse = self.get_json(url, None).await?;
        let books = books_from_map(response.data);

        // Older backends omit pagination; the page itself is then all there is
        let pagination = if response.pagination.per_page == 0 {
            Pagination::new(books.len(), per_page, page)
        } else {
            Pagination {
                total: response.pagination.total,
                per_page: response.pagination.per_page,
                current_page: response.pagination.current_page.max(1),
                total_pages: response.pagination.total_pages,
            }
        };

        log::debug!(
            "Catalog page {}/{} ({} books)",
            pagination.current_page,
            pagination.total_pages,
            books.len()
        );
        Ok(CatalogPage { books, pagination })
    }

    async fn book(&self, id: &BookId) -> CatalogResult<Book> {
        let url = self.endpoint(&["api", "book", id.as_str()])?;
        let wire: WireAudiobook = self.get_json(url, Some(id)).await?;
        Ok(wire.into_book(id.clone()))
    }

    async fn media_url(&self, download_id: &str) -> CatalogResult<String> {
        let url = self.endpoint(&["api", "redirect", download_id])?;
        let redirect: WireRedirect = self.get_json(url, None).await?;
        if redirect.url.trim().is_empty() {
            return Err(CatalogError::Decode("redirect has an empty url".to_string()));
        }
        Ok(redirect.url)
    }
}
