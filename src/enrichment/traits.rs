//! Trait definitions for external catalog clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! # Example
//!
//! ```ignore
//! use bookfetch::enrichment::traits::BookCatalog;
//!
//! // In production code:
//! async fn lookup<C: BookCatalog>(catalog: &C, isbn: &str) {
//!     let metadata = catalog.fetch_by_isbn(isbn).await?;
//! }
//!
//! // In tests:
//! struct MockCatalog { ... }
//! impl BookCatalog for MockCatalog { ... }
//! ```

use async_trait::async_trait;

use super::domain::{BookMetadata, CatalogError, SearchQuery, SearchResult};

/// Trait for a bibliographic catalog source.
///
/// Implement this trait to create mock implementations for testing.
#[async_trait]
pub trait BookCatalog: Send + Sync {
    /// Look up a book by its 13-digit ISBN.
    ///
    /// `Ok(None)` means the catalog does not know the book.
    async fn fetch_by_isbn(&self, isbn: &str) -> Result<Option<BookMetadata>, CatalogError>;

    /// Search for books by title and/or author.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, CatalogError>;

    /// Probe whether the catalog is reachable.
    async fn health_check(&self) -> bool;

    /// Machine identifier, used in cache keys and metrics.
    fn name(&self) -> &'static str;

    /// Human-readable name, used in messages.
    fn display_name(&self) -> &'static str;
}

// Implement the trait for the real client

#[async_trait]
impl BookCatalog for super::openlibrary::OpenLibraryClient {
    async fn fetch_by_isbn(&self, isbn: &str) -> Result<Option<BookMetadata>, CatalogError> {
        self.fetch_by_isbn(isbn).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, CatalogError> {
        self.search(query).await
    }

    async fn health_check(&self) -> bool {
        self.health_check().await
    }

    fn name(&self) -> &'static str {
        super::openlibrary::SOURCE
    }

    fn display_name(&self) -> &'static str {
        "OpenLibrary"
    }
}
