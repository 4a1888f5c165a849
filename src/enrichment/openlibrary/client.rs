//! OpenLibrary HTTP client
//!
//! Handles communication with the OpenLibrary web service.
//! See: https://openlibrary.org/dev/docs/api/books
//!
//! Two endpoints are used: `/api/books` for ISBN lookups (with
//! `jscmd=details` to get the full record) and `/search.json` for
//! title/author searches. Both go through the shared rate-limited
//! transport; OpenLibrary asks bulk consumers to keep a polite request
//! rate and identify themselves via User-Agent.
//!
//! "Book not known" comes back in several disguises: an HTTP 404, an
//! empty JSON object, or an entry without a `details` block. All three
//! map to `Ok(None)` so callers only see errors for real failures.

use tracing::{info, warn};

use super::{adapter, dto};
use crate::enrichment::domain::{BookMetadata, CatalogError, SearchQuery, SearchResult};
use crate::enrichment::transport::{RateLimitedTransport, TransportConfig};

/// Fields requested from the search endpoint; anything more is wasted
/// bytes on a hot path
const SEARCH_FIELDS: &str = "key,title,author_name,first_publish_year,isbn,cover_i";

const MAX_SEARCH_LIMIT: usize = 100;

/// OpenLibrary API client
pub struct OpenLibraryClient {
    transport: RateLimitedTransport,
}

impl OpenLibraryClient {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            transport: RateLimitedTransport::new(config),
        }
    }

    /// Create a client pointing at a custom base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::new(TransportConfig {
            base_url: base_url.into(),
            ..TransportConfig::default()
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Look up a book record by its 13-digit ISBN.
    ///
    /// Returns `Ok(None)` when the catalog has no such book; errors are
    /// reserved for real failures (bad status, malformed body, network).
    pub async fn fetch_by_isbn(&self, isbn: &str) -> Result<Option<BookMetadata>, CatalogError> {
        if isbn.len() != 13 {
            return Err(CatalogError::InvalidInput(
                "ISBN must be 13 digits".to_string(),
            ));
        }
        if !isbn.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CatalogError::InvalidInput(
                "ISBN must contain only digits".to_string(),
            ));
        }

        let bibkey = format!("ISBN:{isbn}");
        let params = [
            ("bibkeys", bibkey.clone()),
            ("format", "json".to_string()),
            ("jscmd", "details".to_string()),
        ];

        let response = self.transport.get("/api/books", &params).await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            info!(isbn, "Book not found in OpenLibrary");
            return Ok(None);
        }
        if status != reqwest::StatusCode::OK {
            warn!(isbn, status = status.as_u16(), "OpenLibrary returned an error status");
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body: dto::BooksResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        let Some(entry) = body.get(&bibkey) else {
            info!(isbn, "Book not found in OpenLibrary");
            return Ok(None);
        };
        let Some(details) = entry.details.as_ref() else {
            warn!(isbn, "OpenLibrary record has no details block");
            return Ok(None);
        };

        let metadata = adapter::to_metadata(isbn, details);
        info!(
            isbn,
            title = %metadata.title,
            authors = metadata.authors.len(),
            "Fetched book from OpenLibrary"
        );
        Ok(Some(metadata))
    }

    /// Search for books by title and/or author
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, CatalogError> {
        let title = query.title.as_deref().filter(|t| !t.trim().is_empty());
        let author = query.author.as_deref().filter(|a| !a.trim().is_empty());
        if title.is_none() && author.is_none() {
            return Err(CatalogError::InvalidInput(
                "Must provide title or author for search".to_string(),
            ));
        }
        if query.limit < 1 || query.limit > MAX_SEARCH_LIMIT {
            return Err(CatalogError::InvalidInput(
                "Limit must be between 1 and 100".to_string(),
            ));
        }

        let mut query_parts = Vec::new();
        if let Some(t) = title {
            query_parts.push(format!("title:\"{t}\""));
        }
        if let Some(a) = author {
            query_parts.push(format!("author:\"{a}\""));
        }
        let q = query_parts.join(" AND ");

        let params = [
            ("q", q.clone()),
            ("limit", query.limit.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];

        let response = self.transport.get("/search.json", &params).await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(query = %q, status = status.as_u16(), "OpenLibrary search failed");
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let body: dto::SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        info!(
            query = %q,
            results = body.docs.len(),
            total_found = body.num_found,
            "OpenLibrary search completed"
        );
        Ok(body.docs.iter().map(adapter::to_search_result).collect())
    }

    /// Probe the service root; true when it answers 200
    pub async fn health_check(&self) -> bool {
        self.transport.health_check().await
    }
}
