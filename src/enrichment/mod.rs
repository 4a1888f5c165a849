//! Book enrichment module - fetches and validates bibliographic metadata from external catalogs.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`openlibrary/dto.rs`) - Exact API response shapes
//! - **Adapters** - Convert DTOs to domain models, cleaning as they go
//! - **Clients** - HTTP clients for external catalogs
//! - **Transport** - Shared rate limiting, retries, and timeouts
//! - **Cache** - TTL cache over fetched records
//! - **Quality** - Completeness scoring and suspicious-data detection
//! - **Jobs** - Per-request lifecycle tracking with bounded history
//! - **Metrics** - Call outcomes and health aggregation
//! - **Service** - High-level orchestration of the enrichment flow
//!
//! This decoupling means:
//! 1. API changes don't ripple through our codebase
//! 2. We can test API contracts independently
//! 3. We can swap catalog providers without changing business logic
//!
//! # Usage
//!
//! ```ignore
//! use enrichment::{EnrichmentConfig, EnrichmentRequest, EnrichmentService};
//! use enrichment::openlibrary::OpenLibraryClient;
//! use enrichment::transport::TransportConfig;
//!
//! let client = OpenLibraryClient::new(TransportConfig::default());
//! let service = EnrichmentService::new(client, EnrichmentConfig::default());
//!
//! // Enrich one book
//! let result = service.enrich_book(EnrichmentRequest::new("9780134685991")).await;
//! println!("{}: {:?}", result.status, result.metadata.map(|m| m.title));
//! ```

pub mod cache;
pub mod domain;
pub mod job;
pub mod metrics;
pub mod openlibrary;
pub mod quality;
pub mod service;
pub mod traits;
pub mod transport;

pub use domain::{
    BookMetadata, CatalogError, EnrichmentRequest, EnrichmentResult, EnrichmentStatus,
    ErrorCategory, SearchQuery, SearchResult,
};
pub use service::{EnrichmentConfig, EnrichmentService};
pub use traits::BookCatalog;
pub use transport::TransportConfig;
