//! OpenLibrary API Data Transfer Objects
//!
//! These types match EXACTLY what the OpenLibrary API returns.
//! DO NOT add fields that aren't in the API response.
//! DO NOT use these types outside the openlibrary module - convert to domain types.
//!
//! API docs: https://openlibrary.org/dev/docs/api/books
//!
//! The books endpoint returns an object keyed by the requested bibkey
//! (`ISBN:<digits>`). Several fields arrive in more than one shape
//! (authors as objects or bare strings, description as a string or a
//! typed object), so those get custom deserializers instead of plain
//! derives.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

/// Bibkey -> record. A missing key means the book is not in the catalog.
pub type BooksResponse = HashMap<String, BookEntry>;

/// One record from the books endpoint. `details` is only present when
/// the request asked for `jscmd=details`, and even then some records
/// omit it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookEntry {
    pub details: Option<BookDetails>,
}

/// The `details` substructure of a book record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookDetails {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// Author entries are usually `{"key": ..., "name": ...}` objects,
    /// but old records carry bare name strings
    #[serde(default, deserialize_with = "authors_mixed")]
    pub authors: Vec<Author>,
    /// Free text, e.g. "March 2018", "1994", "2001-05-01"
    pub publish_date: Option<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub isbn_10: Vec<String>,
    #[serde(default)]
    pub isbn_13: Vec<String>,
    pub number_of_pages: Option<i64>,
    /// Cover ids; non-integer entries are dropped
    #[serde(default, deserialize_with = "covers_integers_only")]
    pub covers: Vec<i64>,
    /// Either a bare string or `{"type": "/type/text", "value": ...}`
    #[serde(default, deserialize_with = "description_text")]
    pub description: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    /// References like `{"key": "/languages/eng"}`, reduced to the code
    #[serde(default, deserialize_with = "language_codes")]
    pub languages: Vec<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub key: Option<String>,
    pub name: Option<String>,
}

/// Publish dates are free text; years outside 1500-2199 are noise
/// (scan artifacts, list prices, page counts)
static PLAUSIBLE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(1[5-9]\d\d|20\d\d|21\d\d)\b").expect("Invalid year regex")
});

impl BookDetails {
    /// Author display names, skipping entries without one
    pub fn author_names(&self) -> Vec<String> {
        self.authors.iter().filter_map(|a| a.name.clone()).collect()
    }

    /// First plausible 4-digit year found in the publish date
    pub fn publication_year(&self) -> Option<i32> {
        let date = self.publish_date.as_deref()?;
        PLAUSIBLE_YEAR
            .find(date)
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn primary_isbn_10(&self) -> Option<&str> {
        self.isbn_10.first().map(String::as_str)
    }

    /// Cover image URL, size "S", "M" or "L"
    pub fn cover_url(&self, size: &str) -> Option<String> {
        self.covers.first().map(|id| cover_image_url(*id, size))
    }
}

/// Response from the search endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
    /// The live API sends `numFound`; some mirrors send `num_found`
    #[serde(default, alias = "numFound")]
    pub num_found: i64,
}

/// One search hit, limited to the fields we request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchDoc {
    pub key: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    pub first_publish_year: Option<i32>,
    /// Raw ISBN list, ISBN-10s and ISBN-13s interleaved
    #[serde(default)]
    pub isbn: Vec<String>,
    pub cover_i: Option<i64>,
}

impl SearchDoc {
    pub fn cover_url(&self, size: &str) -> Option<String> {
        self.cover_i.map(|id| cover_image_url(id, size))
    }
}

pub(crate) fn cover_image_url(id: i64, size: &str) -> String {
    format!("https://covers.openlibrary.org/b/id/{id}-{size}.jpg")
}

fn authors_mixed<'de, D>(deserializer: D) -> Result<Vec<Author>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    let mut authors = Vec::new();
    for value in raw.unwrap_or_default() {
        match value {
            serde_json::Value::String(name) => authors.push(Author {
                key: None,
                name: Some(name),
            }),
            serde_json::Value::Object(_) => {
                // Unrecognized object shapes are dropped, not errors
                if let Ok(author) = serde_json::from_value::<Author>(value) {
                    authors.push(author);
                }
            }
            _ => {}
        }
    }
    Ok(authors)
}

fn covers_integers_only<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(serde_json::Value::as_i64)
        .collect())
}

fn description_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    let text = match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Object(map)) => map
            .get("value")
            .and_then(serde_json::Value::as_str)
            .map(String::from),
        _ => None,
    };
    Ok(text.filter(|s| !s.is_empty()))
}

fn language_codes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| entry.get("key").and_then(serde_json::Value::as_str))
        .filter_map(|key| key.rsplit('/').next())
        .filter(|code| !code.is_empty())
        .map(String::from)
        .collect())
}

// ============================================================================
// CONTRACT TESTS - These verify our DTOs match the actual API responses
// ============================================================================
#[cfg(test)]
mod contract_tests {
    use super::*;

    #[test]
    fn test_parse_books_response_with_details() {
        // Trimmed from a real /api/books?bibkeys=ISBN:9780134685991 response
        let json = r#"{
            "ISBN:9780134685991": {
                "bib_key": "ISBN:9780134685991",
                "info_url": "https://openlibrary.org/books/OL26332930M",
                "details": {
                    "title": "Effective Java",
                    "subtitle": "Third Edition",
                    "authors": [
                        {"key": "/authors/OL1394244A", "name": "Joshua Bloch"}
                    ],
                    "publish_date": "2018",
                    "publishers": ["Addison-Wesley"],
                    "isbn_10": ["0134685997"],
                    "isbn_13": ["9780134685991"],
                    "number_of_pages": 414,
                    "covers": [8739161],
                    "subjects": ["Java (Computer program language)"],
                    "languages": [{"key": "/languages/eng"}],
                    "key": "/books/OL26332930M"
                }
            }
        }"#;

        let response: BooksResponse =
            serde_json::from_str(json).expect("Should parse books response");
        let entry = response
            .get("ISBN:9780134685991")
            .expect("Should contain requested bibkey");
        let details = entry.details.as_ref().expect("Should have details");

        assert_eq!(details.title.as_deref(), Some("Effective Java"));
        assert_eq!(details.subtitle.as_deref(), Some("Third Edition"));
        assert_eq!(details.author_names(), vec!["Joshua Bloch"]);
        assert_eq!(details.publication_year(), Some(2018));
        assert_eq!(details.publishers, vec!["Addison-Wesley"]);
        assert_eq!(details.primary_isbn_10(), Some("0134685997"));
        assert_eq!(details.number_of_pages, Some(414));
        assert_eq!(details.covers, vec![8739161]);
        assert_eq!(details.languages, vec!["eng"]);
    }

    #[test]
    fn test_parse_entry_without_details() {
        // Records fetched without jscmd=details only carry link fields
        let json = r#"{
            "ISBN:9780000000002": {
                "bib_key": "ISBN:9780000000002",
                "info_url": "https://openlibrary.org/books/OL1M"
            }
        }"#;

        let response: BooksResponse =
            serde_json::from_str(json).expect("Should parse entry without details");
        assert!(response["ISBN:9780000000002"].details.is_none());
    }

    #[test]
    fn test_parse_empty_response() {
        // Unknown ISBNs produce an empty object, not a 404
        let response: BooksResponse = serde_json::from_str("{}").expect("Should parse empty object");
        assert!(response.is_empty());
    }

    #[test]
    fn test_parse_authors_mixed_shapes() {
        let json = r#"{
            "authors": [
                {"key": "/authors/OL1A", "name": "Jane Doe"},
                "Bare Name String",
                {"key": "/authors/OL2A"},
                42,
                null
            ]
        }"#;

        let details: BookDetails =
            serde_json::from_str(json).expect("Should parse mixed author shapes");
        assert_eq!(details.authors.len(), 3);
        assert_eq!(details.author_names(), vec!["Jane Doe", "Bare Name String"]);
    }

    #[test]
    fn test_parse_description_as_string() {
        let json = r#"{"description": "A plain string description"}"#;
        let details: BookDetails = serde_json::from_str(json).expect("Should parse description");
        assert_eq!(details.description.as_deref(), Some("A plain string description"));
    }

    #[test]
    fn test_parse_description_as_typed_object() {
        let json = r#"{"description": {"type": "/type/text", "value": "Object-wrapped text"}}"#;
        let details: BookDetails = serde_json::from_str(json).expect("Should parse description");
        assert_eq!(details.description.as_deref(), Some("Object-wrapped text"));
    }

    #[test]
    fn test_parse_description_empty_or_malformed() {
        let details: BookDetails =
            serde_json::from_str(r#"{"description": ""}"#).expect("Should parse");
        assert!(details.description.is_none());

        let details: BookDetails =
            serde_json::from_str(r#"{"description": {"type": "/type/text"}}"#).expect("Should parse");
        assert!(details.description.is_none());

        let details: BookDetails =
            serde_json::from_str(r#"{"description": 7}"#).expect("Should parse");
        assert!(details.description.is_none());
    }

    #[test]
    fn test_parse_covers_drops_non_integers() {
        let json = r#"{"covers": [240726, "oops", null, 3.5, 11]}"#;
        let details: BookDetails = serde_json::from_str(json).expect("Should parse covers");
        assert_eq!(details.covers, vec![240726, 11]);
    }

    #[test]
    fn test_parse_minimal_details() {
        let details: BookDetails = serde_json::from_str("{}").expect("Should parse empty details");
        assert!(details.title.is_none());
        assert!(details.authors.is_empty());
        assert!(details.publishers.is_empty());
        assert!(details.covers.is_empty());
        assert!(details.description.is_none());
    }

    #[test]
    fn test_publication_year_from_free_text() {
        let with_date = |d: &str| BookDetails {
            publish_date: Some(d.to_string()),
            ..Default::default()
        };

        assert_eq!(with_date("March 2018").publication_year(), Some(2018));
        assert_eq!(with_date("1994").publication_year(), Some(1994));
        assert_eq!(with_date("2001-05-01").publication_year(), Some(2001));
        // First match wins
        assert_eq!(with_date("1987, reprinted 1999").publication_year(), Some(1987));
        // Out-of-range numbers are not years
        assert_eq!(with_date("1203").publication_year(), None);
        assert_eq!(with_date("page 3500").publication_year(), None);
        assert_eq!(with_date("n.d.").publication_year(), None);
        assert_eq!(BookDetails::default().publication_year(), None);
    }

    #[test]
    fn test_cover_url_sizes() {
        let details = BookDetails {
            covers: vec![8739161, 22],
            ..Default::default()
        };
        assert_eq!(
            details.cover_url("L").as_deref(),
            Some("https://covers.openlibrary.org/b/id/8739161-L.jpg")
        );
        assert!(BookDetails::default().cover_url("L").is_none());
    }

    #[test]
    fn test_parse_search_response() {
        // Trimmed from a real /search.json response; note camelCase numFound
        let json = r#"{
            "numFound": 523,
            "start": 0,
            "docs": [
                {
                    "key": "/works/OL1914022W",
                    "title": "The Pragmatic Programmer",
                    "author_name": ["Andrew Hunt", "David Thomas"],
                    "first_publish_year": 1999,
                    "isbn": ["020161622X", "9780201616224"],
                    "cover_i": 12010969
                }
            ]
        }"#;

        let response: SearchResponse =
            serde_json::from_str(json).expect("Should parse search response");
        assert_eq!(response.num_found, 523);
        assert_eq!(response.docs.len(), 1);

        let doc = &response.docs[0];
        assert_eq!(doc.title.as_deref(), Some("The Pragmatic Programmer"));
        assert_eq!(doc.author_name.len(), 2);
        assert_eq!(doc.first_publish_year, Some(1999));
        assert_eq!(
            doc.cover_url("M").as_deref(),
            Some("https://covers.openlibrary.org/b/id/12010969-M.jpg")
        );
    }

    #[test]
    fn test_parse_search_response_snake_case_alias() {
        let json = r#"{"num_found": 3, "docs": []}"#;
        let response: SearchResponse =
            serde_json::from_str(json).expect("Should parse snake_case variant");
        assert_eq!(response.num_found, 3);
        assert!(response.docs.is_empty());
    }

    #[test]
    fn test_parse_search_doc_missing_fields() {
        let doc: SearchDoc = serde_json::from_str(r#"{"key": "/works/OL1W"}"#)
            .expect("Should parse sparse search doc");
        assert!(doc.title.is_none());
        assert!(doc.author_name.is_empty());
        assert!(doc.isbn.is_empty());
        assert!(doc.cover_url("M").is_none());
    }
}
