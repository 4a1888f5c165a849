//! Adapter layer: Convert OpenLibrary DTOs to domain models
//!
//! This is the ONLY place where OpenLibrary DTO types are converted to our
//! domain types. Raw records are messy (HTML fragments in titles,
//! "Last, First" author names, placeholder publishers), so the cleanup
//! functions from the quality module are applied here, on the way in.

use tracing::warn;

use super::dto;
use crate::enrichment::domain::{BookMetadata, SearchResult};
use crate::enrichment::quality;
use crate::isbn;

const MAX_TITLE_LEN: usize = 500;
const MAX_SUBTITLE_LEN: usize = 200;
const MAX_PUBLISHER_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;
const MAX_SUBJECT_LEN: usize = 100;
const MAX_SUBJECTS: usize = 10;

/// Cover sizes served by covers.openlibrary.org
const DETAIL_COVER_SIZE: &str = "L";
const SEARCH_COVER_SIZE: &str = "M";

/// Convert a books-endpoint record into domain metadata.
///
/// `isbn` is the normalized ISBN-13 the caller requested; it becomes the
/// canonical identifier even when the record lists others.
pub fn to_metadata(isbn: &str, details: &dto::BookDetails) -> BookMetadata {
    let mut metadata = BookMetadata::new(isbn);

    metadata.title = details
        .title
        .as_deref()
        .and_then(|t| quality::sanitize_text(t, MAX_TITLE_LEN))
        .unwrap_or_else(|| "Unknown Title".to_string());
    metadata.subtitle = details
        .subtitle
        .as_deref()
        .and_then(|s| quality::sanitize_text(s, MAX_SUBTITLE_LEN));
    metadata.authors = quality::normalize_author_names(&details.author_names());

    metadata.publication_year = details.publication_year();
    // A bare year like "87" is too ambiguous to anchor a date on
    if metadata.publication_year.is_some()
        && let Some(raw) = details.publish_date.as_deref()
        && raw.len() >= 4
    {
        metadata.publication_date = match quality::validate_publication_date(raw) {
            Ok(date) => date,
            Err(e) => {
                warn!(publish_date = raw, error = %e, "Rejecting publication date");
                None
            }
        };
    }

    metadata.publishers = details
        .publishers
        .iter()
        .filter_map(|p| quality::sanitize_text(p, MAX_PUBLISHER_LEN))
        .collect();
    metadata.publisher = details
        .publishers
        .iter()
        .find_map(|p| quality::validate_publisher_name(p));

    metadata.page_count = details
        .number_of_pages
        .and_then(|n| u32::try_from(n).ok());
    metadata.language = details.languages.first().cloned();
    metadata.description = details
        .description
        .as_deref()
        .and_then(|d| quality::sanitize_text(d, MAX_DESCRIPTION_LEN));
    metadata.cover_image_url = details.cover_url(DETAIL_COVER_SIZE);
    metadata.subjects = collect_subjects(&details.subjects);

    metadata.isbn_10 = details
        .primary_isbn_10()
        .map(str::to_string)
        .or_else(|| isbn::isbn13_to_10(isbn).ok().flatten());

    metadata.quality_score = metadata.calculate_quality_score();
    metadata
}

/// Trim, drop oversized entries, dedupe case-insensitively (first
/// casing wins), keep at most `MAX_SUBJECTS`.
fn collect_subjects(raw: &[String]) -> Vec<String> {
    let mut subjects = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for subject in raw {
        let trimmed = subject.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_SUBJECT_LEN {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            subjects.push(trimmed.to_string());
            if subjects.len() == MAX_SUBJECTS {
                break;
            }
        }
    }
    subjects
}

/// Convert a search hit into a domain search result
pub fn to_search_result(doc: &dto::SearchDoc) -> SearchResult {
    SearchResult {
        key: doc.key.clone().unwrap_or_default(),
        title: doc
            .title
            .clone()
            .unwrap_or_else(|| "Unknown Title".to_string()),
        authors: doc.author_name.clone(),
        first_publish_year: doc.first_publish_year,
        isbn_13: doc
            .isbn
            .iter()
            .find(|s| s.len() == 13 && s.bytes().all(|b| b.is_ascii_digit()))
            .cloned(),
        cover_url: doc.cover_url(SEARCH_COVER_SIZE),
    }
}
