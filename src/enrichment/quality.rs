//! Data quality assessment for fetched book metadata.
//!
//! Free text from bibliographic sources arrives with HTML fragments,
//! entity escapes, and odd Unicode. Everything user-visible passes
//! through [`sanitize_text`] before it lands in a
//! [`BookMetadata`](super::domain::BookMetadata), and the assembled
//! record is scored for completeness and screened for placeholder junk.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, Utc};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::domain::BookMetadata;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Failed to compile HTML tag pattern"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace pattern"));

/// Anything outside the normal run of word characters and punctuation.
static SUSPICIOUS_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[^\w\s\-.'",!?:;()/&]"#).expect("Failed to compile suspicious text pattern")
});

/// First plausible publication year: 1500-2029.
static YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(1[5-9]\d{2}|20[0-2]\d)\b").expect("Failed to compile year pattern"));

static PUBLISHER_PLACEHOLDERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^unknown$",
        r"^n/a$",
        r"^not available$",
        // dot covers both "self-published" and "self published"
        r"^self.published$",
        // bare numbers
        r"^[0-9]+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile publisher pattern"))
    .collect()
});

/// A publication date outside the believable range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualityError {
    #[error("Publication year {year} is too early (minimum: 1500)")]
    YearTooEarly { year: i32 },

    #[error("Publication year {year} is too far in future (maximum: {max})")]
    YearTooLate { year: i32, max: i32 },
}

/// Clean up a piece of free text from an upstream source.
///
/// Strips HTML tags, decodes entities, applies NFKC compatibility
/// normalization, and collapses whitespace runs. Text longer than
/// `max_length` characters is truncated at a word boundary with "..."
/// appended. Returns `None` when nothing survives.
pub fn sanitize_text(text: &str, max_length: usize) -> Option<String> {
    let stripped = HTML_TAG.replace_all(text, "");
    let unescaped = unescape_entities(&stripped);
    let normalized: String = unescaped.nfkc().collect();
    let mut sanitized = WHITESPACE.replace_all(&normalized, " ").trim().to_string();

    if sanitized.chars().count() > max_length {
        let prefix: String = sanitized.chars().take(max_length).collect();
        sanitized = match prefix.rsplit_once(' ') {
            Some((head, _)) => head.to_string(),
            None => prefix,
        };
        sanitized.push_str("...");
    }

    if SUSPICIOUS_CHARS.is_match(&sanitized) {
        let preview: String = if sanitized.chars().count() > 100 {
            sanitized.chars().take(100).collect::<String>() + "..."
        } else {
            sanitized.clone()
        };
        tracing::warn!(text = %preview, "suspicious characters detected in text");
    }

    if sanitized.is_empty() { None } else { Some(sanitized) }
}

/// Decode the handful of HTML entities that actually show up in library
/// descriptions. `&amp;` goes last so escaped entities don't
/// double-decode.
fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// First 4-digit run in 1500-2029 found anywhere in the text.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Reject years before 1500 or more than two years into the future.
pub fn validate_year(year: i32) -> Result<(), QualityError> {
    let max = Utc::now().year() + 2;
    if year < 1500 {
        return Err(QualityError::YearTooEarly { year });
    }
    if year > max {
        return Err(QualityError::YearTooLate { year, max });
    }
    Ok(())
}

/// Pull a publication date out of a free-text date string.
///
/// Upstream publish dates range from "2018" to "March 3, 2018" to
/// outright garbage, so this only trusts the year and defaults to
/// January 1st. Unparseable strings are `Ok(None)`, not an error;
/// a parsed year outside the believable range is.
pub fn validate_publication_date(input: &str) -> Result<Option<NaiveDate>, QualityError> {
    let Some(year) = extract_year(input) else {
        tracing::warn!(input, "could not parse date string");
        return Ok(None);
    };
    validate_year(year)?;
    Ok(NaiveDate::from_ymd_opt(year, 1, 1))
}

/// Sanitize a publisher name, dropping placeholder values entirely.
pub fn validate_publisher_name(publisher: &str) -> Option<String> {
    let sanitized = sanitize_text(publisher, 200)?;
    let lowered = sanitized.to_lowercase();

    for pattern in PUBLISHER_PLACEHOLDERS.iter() {
        if pattern.is_match(&lowered) {
            tracing::debug!(publisher = %sanitized, "placeholder publisher rejected");
            return None;
        }
    }

    Some(sanitized)
}

/// Sanitize author names, flip "Last, First" to "First Last", and
/// deduplicate case-insensitively preserving first-seen order.
pub fn normalize_author_names(authors: &[String]) -> Vec<String> {
    let mut normalized = Vec::new();
    let mut seen = HashSet::new();

    for author in authors {
        let Some(clean) = sanitize_text(author, 100) else {
            continue;
        };

        // Only flip when there is exactly one comma and text on both sides.
        let name = match clean.split_once(',') {
            Some((last, first))
                if clean.matches(',').count() == 1
                    && !last.trim().is_empty()
                    && !first.trim().is_empty() =>
            {
                format!("{} {}", first.trim(), last.trim())
            }
            _ => clean,
        };

        if seen.insert(name.to_lowercase()) {
            normalized.push(name);
        }
    }

    normalized
}

bitflags::bitflags! {
    /// The metadata fields that count toward completeness.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MetadataFields: u16 {
        const TITLE = 1 << 0;
        const AUTHORS = 1 << 1;
        const PUBLICATION_DATE = 1 << 2;
        const PUBLISHER = 1 << 3;
        const DESCRIPTION = 1 << 4;
        const PAGE_COUNT = 1 << 5;
        const LANGUAGE = 1 << 6;
        const COVER_IMAGE = 1 << 7;
    }
}

/// Field weights by importance; together they sum to 100.
const FIELD_WEIGHTS: [(MetadataFields, f64); 8] = [
    (MetadataFields::TITLE, 25.0),
    (MetadataFields::AUTHORS, 20.0),
    (MetadataFields::PUBLICATION_DATE, 15.0),
    (MetadataFields::PUBLISHER, 10.0),
    (MetadataFields::DESCRIPTION, 10.0),
    (MetadataFields::PAGE_COUNT, 8.0),
    (MetadataFields::LANGUAGE, 7.0),
    (MetadataFields::COVER_IMAGE, 5.0),
];

impl MetadataFields {
    /// Combined weight of every field present in this set.
    pub fn weight(self) -> f64 {
        FIELD_WEIGHTS
            .iter()
            .filter(|(field, _)| self.contains(*field))
            .map(|(_, weight)| weight)
            .sum()
    }
}

/// Which scoreable fields a record actually populates. A field counts
/// only when meaningfully non-empty: strings non-blank after trim,
/// page count positive, at least one non-blank author.
pub fn present_fields(metadata: &BookMetadata) -> MetadataFields {
    let mut fields = MetadataFields::empty();

    if !metadata.title.trim().is_empty() {
        fields |= MetadataFields::TITLE;
    }
    if metadata.authors.iter().any(|a| !a.trim().is_empty()) {
        fields |= MetadataFields::AUTHORS;
    }
    if metadata.publication_date.is_some() {
        fields |= MetadataFields::PUBLICATION_DATE;
    }
    if metadata.publisher.as_deref().is_some_and(|p| !p.trim().is_empty()) {
        fields |= MetadataFields::PUBLISHER;
    }
    if metadata.description.as_deref().is_some_and(|d| !d.trim().is_empty()) {
        fields |= MetadataFields::DESCRIPTION;
    }
    if metadata.page_count.is_some_and(|n| n > 0) {
        fields |= MetadataFields::PAGE_COUNT;
    }
    if metadata.language.as_deref().is_some_and(|l| !l.trim().is_empty()) {
        fields |= MetadataFields::LANGUAGE;
    }
    if metadata.cover_image_url.as_deref().is_some_and(|u| !u.trim().is_empty()) {
        fields |= MetadataFields::COVER_IMAGE;
    }

    fields
}

/// Weighted completeness of a record, 0.0 to 100.0.
pub fn calculate_completeness_score(metadata: &BookMetadata) -> f64 {
    present_fields(metadata).weight()
}

/// A specific oddity found in a record's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityWarning {
    TitleTooShort,
    TitleTooLong,
    TitlePlaceholder,
    TooManyAuthors,
    AuthorTooShort(String),
    AuthorPlaceholder(String),
    DateTooEarly,
    DateInFuture,
    PageCountNonPositive,
    PageCountTooHigh,
    PublisherPlaceholder,
}

impl std::fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleTooShort => write!(f, "Title is too short"),
            Self::TitleTooLong => write!(f, "Title is unusually long"),
            Self::TitlePlaceholder => write!(f, "Title appears to be placeholder text"),
            Self::TooManyAuthors => write!(f, "Unusually high number of authors"),
            Self::AuthorTooShort(name) => write!(f, "Author name too short: {name}"),
            Self::AuthorPlaceholder(name) => {
                write!(f, "Author appears to be placeholder: {name}")
            }
            Self::DateTooEarly => write!(f, "Publication date is suspiciously early"),
            Self::DateInFuture => write!(f, "Publication date is in the future"),
            Self::PageCountNonPositive => write!(f, "Page count is zero or negative"),
            Self::PageCountTooHigh => write!(f, "Page count is unusually high"),
            Self::PublisherPlaceholder => write!(f, "Publisher appears to be placeholder text"),
        }
    }
}

/// Scan a record for placeholder values and implausible numbers.
/// Warnings flag data for review; they never reject a record outright.
pub fn detect_suspicious_data(metadata: &BookMetadata) -> Vec<QualityWarning> {
    let mut warnings = Vec::new();

    if !metadata.title.is_empty() {
        let title_len = metadata.title.chars().count();
        if title_len < 2 {
            warnings.push(QualityWarning::TitleTooShort);
        } else if title_len > 500 {
            warnings.push(QualityWarning::TitleTooLong);
        } else if matches!(
            metadata.title.to_lowercase().as_str(),
            "unknown" | "n/a" | "untitled"
        ) {
            warnings.push(QualityWarning::TitlePlaceholder);
        }
    }

    if !metadata.authors.is_empty() {
        if metadata.authors.len() > 10 {
            warnings.push(QualityWarning::TooManyAuthors);
        }
        for author in &metadata.authors {
            if author.chars().count() < 2 {
                warnings.push(QualityWarning::AuthorTooShort(author.clone()));
            } else if matches!(
                author.to_lowercase().as_str(),
                "unknown" | "anonymous" | "n/a"
            ) {
                warnings.push(QualityWarning::AuthorPlaceholder(author.clone()));
            }
        }
    }

    if let Some(date) = metadata.publication_date {
        let current_year = Utc::now().year();
        if date.year() < 1500 {
            warnings.push(QualityWarning::DateTooEarly);
        } else if date.year() > current_year + 1 {
            warnings.push(QualityWarning::DateInFuture);
        }
    }

    if let Some(pages) = metadata.page_count {
        if pages < 1 {
            warnings.push(QualityWarning::PageCountNonPositive);
        } else if pages > 10_000 {
            warnings.push(QualityWarning::PageCountTooHigh);
        }
    }

    if let Some(publisher) = &metadata.publisher
        && matches!(
            publisher.to_lowercase().as_str(),
            "unknown" | "self-published" | "n/a"
        )
    {
        warnings.push(QualityWarning::PublisherPlaceholder);
    }

    warnings
}

/// Overall verdict on a record's quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityStatus {
    BelowThreshold,
    Suspicious,
    Acceptable,
}

impl std::fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BelowThreshold => "below_threshold",
            Self::Suspicious => "suspicious",
            Self::Acceptable => "acceptable",
        };
        write!(f, "{s}")
    }
}

/// Full quality assessment of one record.
#[derive(Debug, Clone)]
pub struct QualityReport {
    /// Weighted completeness, 0.0 to 100.0
    pub completeness_score: f64,
    pub quality_status: QualityStatus,
    pub warnings: Vec<QualityWarning>,
    pub missing_fields: Vec<&'static str>,
    pub meets_threshold: bool,
    /// Number of warnings; 3+ flags a record for manual review
    pub suspicion_level: usize,
}

/// Assess a record against a completeness threshold (0-100 scale).
///
/// Status is `BelowThreshold` when the score misses the cutoff,
/// `Suspicious` when it passes but warnings exist, else `Acceptable`.
pub fn validate_metadata_quality(metadata: &BookMetadata, min_completeness: f64) -> QualityReport {
    let completeness_score = calculate_completeness_score(metadata);
    let warnings = detect_suspicious_data(metadata);

    let quality_status = if completeness_score < min_completeness {
        QualityStatus::BelowThreshold
    } else if !warnings.is_empty() {
        QualityStatus::Suspicious
    } else {
        QualityStatus::Acceptable
    };

    let missing_fields = metadata.missing_fields();

    let report = QualityReport {
        completeness_score,
        quality_status,
        suspicion_level: warnings.len(),
        meets_threshold: completeness_score >= min_completeness,
        warnings,
        missing_fields,
    };

    tracing::info!(
        isbn = %metadata.isbn_13,
        completeness_score = report.completeness_score,
        quality_status = %report.quality_status,
        warnings_count = report.suspicion_level,
        missing_fields_count = report.missing_fields.len(),
        "metadata quality assessment completed"
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> BookMetadata {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.title = "Effective Java".to_string();
        metadata.authors = vec!["Joshua Bloch".to_string()];
        metadata.publication_date = NaiveDate::from_ymd_opt(2018, 1, 1);
        metadata.publisher = Some("Addison-Wesley".to_string());
        metadata.description = Some("The definitive guide.".to_string());
        metadata.page_count = Some(412);
        metadata.language = Some("eng".to_string());
        metadata.cover_image_url = Some("https://covers.openlibrary.org/b/id/1-L.jpg".to_string());
        metadata
    }

    #[test]
    fn test_sanitize_strips_html_tags() {
        assert_eq!(
            sanitize_text("<p>Hello <b>world</b></p>", 1000),
            Some("Hello world".to_string())
        );
    }

    #[test]
    fn test_sanitize_unescapes_entities() {
        assert_eq!(
            sanitize_text("Fish &amp; Chips &lt;rare&gt;", 1000),
            Some("Fish & Chips <rare>".to_string())
        );
    }

    #[test]
    fn test_sanitize_does_not_double_decode() {
        // "&amp;lt;" is an escaped "&lt;", not a "<".
        assert_eq!(sanitize_text("&amp;lt;", 1000), Some("&lt;".to_string()));
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(
            sanitize_text("  A \n\t long\r\n  title  ", 1000),
            Some("A long title".to_string())
        );
    }

    #[test]
    fn test_sanitize_applies_nfkc() {
        // U+FB01 is the "fi" ligature.
        assert_eq!(sanitize_text("\u{FB01}le", 1000), Some("file".to_string()));
    }

    #[test]
    fn test_sanitize_empty_yields_none() {
        assert_eq!(sanitize_text("", 1000), None);
        assert_eq!(sanitize_text("   ", 1000), None);
        assert_eq!(sanitize_text("<p></p>", 1000), None);
    }

    #[test]
    fn test_sanitize_truncates_on_word_boundary() {
        assert_eq!(sanitize_text("aaa bbb ccc", 7), Some("aaa...".to_string()));
    }

    #[test]
    fn test_sanitize_truncates_unbroken_text() {
        assert_eq!(sanitize_text("abcdefghij", 5), Some("abcde...".to_string()));
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("Published March 2018 by X"), Some(2018));
        assert_eq!(extract_year("circa 1850"), Some(1850));
        assert_eq!(extract_year("1499"), None);
        assert_eq!(extract_year("3000 AD"), None);
        assert_eq!(extract_year("no year here"), None);
    }

    #[test]
    fn test_validate_year_range() {
        assert!(validate_year(2018).is_ok());
        assert_eq!(
            validate_year(1499),
            Err(QualityError::YearTooEarly { year: 1499 })
        );
        let too_late = Utc::now().year() + 3;
        assert!(matches!(
            validate_year(too_late),
            Err(QualityError::YearTooLate { .. })
        ));
    }

    #[test]
    fn test_validate_publication_date() {
        assert_eq!(
            validate_publication_date("March 2018"),
            Ok(NaiveDate::from_ymd_opt(2018, 1, 1))
        );
        assert_eq!(validate_publication_date("no date"), Ok(None));
    }

    #[test]
    fn test_validate_publisher_accepts_real_names() {
        assert_eq!(
            validate_publisher_name("O'Reilly Media"),
            Some("O'Reilly Media".to_string())
        );
        assert_eq!(
            validate_publisher_name("<b>Penguin</b>"),
            Some("Penguin".to_string())
        );
    }

    #[test]
    fn test_validate_publisher_rejects_placeholders() {
        assert_eq!(validate_publisher_name("Unknown"), None);
        assert_eq!(validate_publisher_name("n/a"), None);
        assert_eq!(validate_publisher_name("not available"), None);
        assert_eq!(validate_publisher_name("self-published"), None);
        assert_eq!(validate_publisher_name("Self Published"), None);
        assert_eq!(validate_publisher_name("12345"), None);
        assert_eq!(validate_publisher_name(""), None);
    }

    #[test]
    fn test_normalize_authors_flips_last_first() {
        let authors = vec!["Bloch, Joshua".to_string(), "Tolkien, J. R. R.".to_string()];
        assert_eq!(
            normalize_author_names(&authors),
            vec!["Joshua Bloch".to_string(), "J. R. R. Tolkien".to_string()]
        );
    }

    #[test]
    fn test_normalize_authors_leaves_multi_comma_names() {
        let authors = vec!["One, Two, Three".to_string()];
        assert_eq!(normalize_author_names(&authors), vec!["One, Two, Three".to_string()]);
    }

    #[test]
    fn test_normalize_authors_dedupes_case_insensitive() {
        let authors = vec![
            "Joshua Bloch".to_string(),
            "joshua bloch".to_string(),
            "Bloch, Joshua".to_string(),
        ];
        assert_eq!(normalize_author_names(&authors), vec!["Joshua Bloch".to_string()]);
    }

    #[test]
    fn test_normalize_authors_drops_empty_entries() {
        let authors = vec![String::new(), "  ".to_string(), "Ann Author".to_string()];
        assert_eq!(normalize_author_names(&authors), vec!["Ann Author".to_string()]);
    }

    #[test]
    fn test_completeness_empty_record() {
        let metadata = BookMetadata::new("9780134685991");
        assert_eq!(calculate_completeness_score(&metadata), 0.0);
    }

    #[test]
    fn test_completeness_full_record() {
        assert_eq!(calculate_completeness_score(&sample_metadata()), 100.0);
    }

    #[test]
    fn test_completeness_partial_record() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.title = "Some Book".to_string();
        metadata.authors = vec!["Someone".to_string()];
        // Title 25 + authors 20.
        assert_eq!(calculate_completeness_score(&metadata), 45.0);
    }

    #[test]
    fn test_completeness_ignores_blank_strings_and_zero_pages() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.title = "   ".to_string();
        metadata.publisher = Some(String::new());
        metadata.page_count = Some(0);
        assert_eq!(calculate_completeness_score(&metadata), 0.0);
    }

    #[test]
    fn test_detect_title_gets_single_warning() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.title = "X".to_string();
        assert_eq!(
            detect_suspicious_data(&metadata),
            vec![QualityWarning::TitleTooShort]
        );

        metadata.title = "Untitled".to_string();
        assert_eq!(
            detect_suspicious_data(&metadata),
            vec![QualityWarning::TitlePlaceholder]
        );
    }

    #[test]
    fn test_detect_author_warnings() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.authors = (0..11).map(|i| format!("Author {i}")).collect();
        metadata.authors.push("Anonymous".to_string());

        let warnings = detect_suspicious_data(&metadata);
        assert!(warnings.contains(&QualityWarning::TooManyAuthors));
        assert!(warnings.contains(&QualityWarning::AuthorPlaceholder("Anonymous".to_string())));
    }

    #[test]
    fn test_detect_future_date() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.publication_date = NaiveDate::from_ymd_opt(Utc::now().year() + 2, 1, 1);
        assert_eq!(
            detect_suspicious_data(&metadata),
            vec![QualityWarning::DateInFuture]
        );
    }

    #[test]
    fn test_detect_page_count_extremes() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.page_count = Some(0);
        assert_eq!(
            detect_suspicious_data(&metadata),
            vec![QualityWarning::PageCountNonPositive]
        );

        metadata.page_count = Some(20_000);
        assert_eq!(
            detect_suspicious_data(&metadata),
            vec![QualityWarning::PageCountTooHigh]
        );
    }

    #[test]
    fn test_detect_clean_record_has_no_warnings() {
        assert!(detect_suspicious_data(&sample_metadata()).is_empty());
    }

    #[test]
    fn test_warning_messages() {
        assert_eq!(QualityWarning::TitleTooShort.to_string(), "Title is too short");
        assert_eq!(
            QualityWarning::AuthorTooShort("J".to_string()).to_string(),
            "Author name too short: J"
        );
        assert_eq!(
            QualityWarning::PublisherPlaceholder.to_string(),
            "Publisher appears to be placeholder text"
        );
    }

    #[test]
    fn test_quality_report_below_threshold() {
        let mut metadata = BookMetadata::new("9780134685991");
        metadata.title = "Some Book".to_string();

        let report = validate_metadata_quality(&metadata, 60.0);
        assert_eq!(report.quality_status, QualityStatus::BelowThreshold);
        assert!(!report.meets_threshold);
        assert_eq!(report.completeness_score, 25.0);
        assert!(report.missing_fields.contains(&"authors"));
    }

    #[test]
    fn test_quality_report_suspicious() {
        let mut metadata = sample_metadata();
        metadata.publisher = Some("Unknown".to_string());

        let report = validate_metadata_quality(&metadata, 60.0);
        assert_eq!(report.quality_status, QualityStatus::Suspicious);
        assert!(report.meets_threshold);
        assert_eq!(report.suspicion_level, 1);
    }

    #[test]
    fn test_quality_report_acceptable() {
        let report = validate_metadata_quality(&sample_metadata(), 60.0);
        assert_eq!(report.quality_status, QualityStatus::Acceptable);
        assert!(report.meets_threshold);
        assert!(report.warnings.is_empty());
        assert!(report.missing_fields.is_empty());
    }
}
