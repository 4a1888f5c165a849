//! Internal domain models for book metadata enrichment.
//!
//! These types are OUR types - they don't change when external APIs change.
//! All external API responses get converted into these types via adapters.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transport::TransportError;

/// Canonical book metadata assembled from an upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Canonical 13-digit identifier
    pub isbn_13: String,
    /// ISBN-10 equivalent when one exists (978-prefixed books only)
    pub isbn_10: Option<String>,
    /// Book title ("Unknown Title" when the source has none)
    pub title: String,
    /// Subtitle, if the source distinguishes one
    pub subtitle: Option<String>,
    /// Cleaned author names, deduplicated, first-seen order
    pub authors: Vec<String>,
    /// Full publication date when a year could be extracted
    pub publication_date: Option<NaiveDate>,
    /// Publication year (may be present without a full date)
    pub publication_year: Option<i32>,
    /// Primary publisher after placeholder filtering
    pub publisher: Option<String>,
    /// All publishers listed by the source
    pub publishers: Vec<String>,
    /// Page count
    pub page_count: Option<u32>,
    /// Primary language code (e.g. "eng")
    pub language: Option<String>,
    /// Sanitized description text
    pub description: Option<String>,
    /// Cover image URL (largest size available)
    pub cover_image_url: Option<String>,
    /// Subject tags, deduplicated case-insensitively, capped at 10
    pub subjects: Vec<String>,
    /// Which upstream source produced this record
    pub source: String,
    /// When the record was fetched
    pub enriched_at: DateTime<Utc>,
    /// Weighted field-coverage score in [0.0, 1.0]
    pub quality_score: f64,
}

impl BookMetadata {
    pub fn new(isbn_13: impl Into<String>) -> Self {
        Self {
            isbn_13: isbn_13.into(),
            isbn_10: None,
            title: String::new(),
            subtitle: None,
            authors: Vec::new(),
            publication_date: None,
            publication_year: None,
            publisher: None,
            publishers: Vec::new(),
            page_count: None,
            language: None,
            description: None,
            cover_image_url: None,
            subjects: Vec::new(),
            source: "openlibrary".to_string(),
            enriched_at: Utc::now(),
            quality_score: 0.0,
        }
    }

    /// Weighted coverage of the fields that matter for a usable record.
    ///
    /// Weights sum to 1.0: title 0.20, authors 0.20, isbn_13 0.15,
    /// date-or-year 0.10, publisher 0.10, cover 0.10, description 0.05,
    /// page count 0.05, subjects 0.05.
    pub fn calculate_quality_score(&self) -> f64 {
        let mut score: f64 = 0.0;

        if !self.title.is_empty() {
            score += 0.20;
        }
        if !self.authors.is_empty() {
            score += 0.20;
        }
        if self.isbn_13.len() == 13 {
            score += 0.15;
        }
        if self.publication_date.is_some() || self.publication_year.is_some() {
            score += 0.10;
        }
        if self.publisher.is_some() {
            score += 0.10;
        }
        if self.cover_image_url.is_some() {
            score += 0.10;
        }
        if self.description.is_some() {
            score += 0.05;
        }
        if self.page_count.is_some_and(|n| n > 0) {
            score += 0.05;
        }
        if !self.subjects.is_empty() {
            score += 0.05;
        }

        score.min(1.0)
    }

    /// Names of the important fields this record is missing.
    ///
    /// Unlike the score, a placeholder title counts as missing here.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();

        if self.title.is_empty() || self.title == "Unknown Title" {
            missing.push("title");
        }
        if self.authors.is_empty() {
            missing.push("authors");
        }
        if self.publication_date.is_none() && self.publication_year.is_none() {
            missing.push("publication_date");
        }
        if self.publisher.is_none() {
            missing.push("publisher");
        }
        if self.cover_image_url.is_none() {
            missing.push("cover_image");
        }
        if self.description.is_none() {
            missing.push("description");
        }

        missing
    }
}

/// Lifecycle states of one enrichment attempt.
///
/// `Pending → InProgress → {Success, Failed, Partial}`; the three
/// outcome states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Partial,
}

impl EnrichmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Partial)
    }
}

impl std::fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Partial => "partial",
        };
        write!(f, "{s}")
    }
}

/// Coarse classification of why a job failed (or only partially
/// succeeded), recorded on the job alongside the human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Input rejected before any network work
    Validation,
    /// Upstream said no: not found, bad status, network exhausted
    Api,
    /// Sub-flow exceeded the per-job timeout
    Timeout,
    /// Metadata obtained but scored below the requested threshold
    Quality,
    /// Anything else
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::Api => "api",
            Self::Timeout => "timeout",
            Self::Quality => "quality",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// Parameters for one enrichment request.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentRequest {
    pub isbn: String,
    /// Skip the cache read (a successful fetch still refreshes the cache)
    pub force_refresh: bool,
    /// Override the configured minimum quality threshold
    pub min_quality_score: Option<f64>,
    /// Correlation id threading this request through logs and results
    pub correlation_id: Option<Uuid>,
}

impl EnrichmentRequest {
    pub fn new(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            ..Default::default()
        }
    }
}

/// Externally visible outcome of one enrichment attempt.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichmentResult {
    pub isbn: String,
    pub status: EnrichmentStatus,
    pub correlation_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub metadata: Option<BookMetadata>,
    pub error: Option<String>,
    pub quality_score: Option<f64>,
    pub sources_used: Vec<String>,
    /// Wall-clock seconds from request entry to result
    pub processing_time: f64,
}

/// Title/author search parameters; at least one of the two must be set.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub limit: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            limit: 10,
        }
    }
}

/// One hit from a title/author search. Lighter than full metadata;
/// a follow-up ISBN lookup gets the complete record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Upstream work key (e.g. "/works/OL123W")
    pub key: String,
    pub title: String,
    pub authors: Vec<String>,
    pub first_publish_year: Option<i32>,
    /// First 13-digit ISBN among the edition's identifiers
    pub isbn_13: Option<String>,
    pub cover_url: Option<String>,
}

/// Errors from a catalog source. "Not found" is NOT an error - lookups
/// return `Ok(None)` for that, so only real failures land here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("upstream returned status {status}")]
    Status { status: u16 },

    #[error("failed to parse upstream response: {0}")]
    Parse(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CatalogError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Status { .. } => "status",
            Self::Parse(_) => "parse",
            Self::Transport(_) => "network",
        }
    }
}
