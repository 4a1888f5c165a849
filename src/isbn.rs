//! ISBN validation, conversion, and extraction.
//!
//! Handles both ISBN-10 and ISBN-13 with their respective checksum
//! algorithms. `normalize` is the main entry point: it accepts either
//! form, with or without hyphens and spaces, and produces the canonical
//! 13-digit representation used everywhere else in the crate.

use std::sync::LazyLock;

use regex::Regex;

/// Why an ISBN string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IsbnError {
    /// Cleaned input was neither 10 nor 13 characters long.
    #[error("ISBN must be 10 or 13 digits, got {len}")]
    InvalidLength { len: usize },

    /// Length was right but the check digit (or a character) was not.
    #[error("ISBN checksum validation failed")]
    InvalidChecksum,

    /// A conversion was asked to start from an invalid ISBN.
    #[error("invalid {0} format")]
    InvalidFormat(&'static str),
}

/// Strip hyphens and whitespace, uppercase any trailing `x` check digit.
pub fn clean(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Check ISBN-10 format and checksum (weighted sum mod 11, `X` = 10).
pub fn is_valid_isbn10(isbn: &str) -> bool {
    let cleaned = clean(isbn);
    let chars: Vec<char> = cleaned.chars().collect();
    if chars.len() != 10 {
        return false;
    }

    let mut checksum = 0u32;
    for (i, &c) in chars.iter().enumerate() {
        let value = match c.to_digit(10) {
            Some(d) => d,
            // Only the final position may carry the X = 10 check value.
            None if i == 9 && c == 'X' => 10,
            None => return false,
        };
        checksum += value * (10 - i as u32);
    }
    checksum % 11 == 0
}

/// Check ISBN-13 format and checksum (alternating 1/3 weights mod 10).
pub fn is_valid_isbn13(isbn: &str) -> bool {
    let cleaned = clean(isbn);
    if cleaned.len() != 13 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    if !cleaned.starts_with("978") && !cleaned.starts_with("979") {
        return false;
    }

    let Some(last) = cleaned.chars().last().and_then(|c| c.to_digit(10)) else {
        return false;
    };
    isbn13_check_digit(&cleaned[..12]) == last
}

/// Convert a valid ISBN-10 to its 978-prefixed ISBN-13 equivalent.
pub fn isbn10_to_13(isbn: &str) -> Result<String, IsbnError> {
    let cleaned = clean(isbn);
    if !is_valid_isbn10(&cleaned) {
        return Err(IsbnError::InvalidFormat("ISBN-10"));
    }

    // Drop the old check digit, prefix with 978, recompute.
    let prefixed = format!("978{}", &cleaned[..9]);
    let check = isbn13_check_digit(&prefixed);
    Ok(format!("{prefixed}{check}"))
}

/// Convert a valid ISBN-13 back to ISBN-10.
///
/// Returns `Ok(None)` for 979-prefixed ISBNs, which have no ISBN-10
/// equivalent. Only errors when the input itself is not a valid ISBN-13.
pub fn isbn13_to_10(isbn: &str) -> Result<Option<String>, IsbnError> {
    let cleaned = clean(isbn);
    if !is_valid_isbn13(&cleaned) {
        return Err(IsbnError::InvalidFormat("ISBN-13"));
    }
    if !cleaned.starts_with("978") {
        return Ok(None);
    }

    let core = &cleaned[3..12];
    Ok(Some(format!("{core}{}", isbn10_check_char(core))))
}

/// Normalize any valid ISBN to the canonical 13-digit form.
pub fn normalize(isbn: &str) -> Result<String, IsbnError> {
    let cleaned = clean(isbn);
    match cleaned.chars().count() {
        10 => {
            if !is_valid_isbn10(&cleaned) {
                return Err(IsbnError::InvalidChecksum);
            }
            isbn10_to_13(&cleaned)
        }
        13 => {
            if !is_valid_isbn13(&cleaned) {
                return Err(IsbnError::InvalidChecksum);
            }
            Ok(cleaned)
        }
        len => Err(IsbnError::InvalidLength { len }),
    }
}

/// True if the input is a valid ISBN in either form.
pub fn is_valid(isbn: &str) -> bool {
    normalize(isbn).is_ok()
}

/// Format an ISBN-13 with display hyphens, e.g. `978-0-134-68599-1`.
///
/// Basic fixed-width grouping; proper splits would need the registrant
/// range tables. Inputs of the wrong length come back cleaned but
/// unhyphenated.
pub fn format_isbn13(isbn: &str) -> String {
    let cleaned = clean(isbn);
    if cleaned.len() != 13 || !cleaned.is_ascii() {
        return cleaned;
    }
    format!(
        "{}-{}-{}-{}-{}",
        &cleaned[..3],
        &cleaned[3..4],
        &cleaned[4..7],
        &cleaned[7..12],
        &cleaned[12..]
    )
}

/// Format an ISBN-10 with display hyphens, e.g. `0-134-68599-7`.
pub fn format_isbn10(isbn: &str) -> String {
    let cleaned = clean(isbn);
    if cleaned.len() != 10 || !cleaned.is_ascii() {
        return cleaned;
    }
    format!(
        "{}-{}-{}-{}",
        &cleaned[..1],
        &cleaned[1..4],
        &cleaned[4..9],
        &cleaned[9..]
    )
}

static ISBN_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:ISBN[-:\s]*)?(?:97[89][-\s]*)?(?:\d[-\s]*){9,12}[\dX]\b")
        .expect("Failed to compile ISBN candidate pattern")
});

static ISBN_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ISBN[-:\s]*").expect("Failed to compile ISBN prefix pattern"));

/// Scan free text for ISBNs and return them normalized to ISBN-13.
///
/// Candidates that fail checksum validation are dropped; duplicates
/// (including the same book in both 10- and 13-digit form) appear once,
/// in order of first occurrence.
pub fn extract_from_text(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    let mut found = Vec::new();

    for candidate in ISBN_CANDIDATE.find_iter(&upper) {
        let stripped = ISBN_PREFIX.replace(candidate.as_str(), "");
        if let Ok(normalized) = normalize(&stripped)
            && !found.contains(&normalized)
        {
            found.push(normalized);
        }
    }
    found
}

fn isbn13_check_digit(digits12: &str) -> u32 {
    let checksum: u32 = digits12
        .chars()
        .enumerate()
        .filter_map(|(i, c)| c.to_digit(10).map(|d| d * if i % 2 == 0 { 1 } else { 3 }))
        .sum();
    (10 - checksum % 10) % 10
}

fn isbn10_check_char(digits9: &str) -> char {
    let checksum: u32 = digits9
        .chars()
        .enumerate()
        .filter_map(|(i, c)| c.to_digit(10).map(|d| d * (10 - i as u32)))
        .sum();
    match checksum % 11 {
        0 => '0',
        1 => 'X',
        r => (b'0' + (11 - r) as u8) as char,
    }
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Generate a valid ISBN-10 by computing the check character
    fn valid_isbn10_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(0u32..10, 9).prop_map(|digits| {
            let core: String = digits
                .iter()
                .map(|d| char::from_digit(*d, 10).unwrap())
                .collect();
            format!("{core}{}", isbn10_check_char(&core))
        })
    }

    /// Generate a valid ISBN-13 with either bookland prefix
    fn valid_isbn13_strategy() -> impl Strategy<Value = String> {
        (
            prop::string::string_regex("97[89]").unwrap(),
            prop::collection::vec(0u32..10, 9),
        )
            .prop_map(|(prefix, digits)| {
                let body: String = digits
                    .iter()
                    .map(|d| char::from_digit(*d, 10).unwrap())
                    .collect();
                let core = format!("{prefix}{body}");
                format!("{core}{}", isbn13_check_digit(&core))
            })
    }

    proptest! {
        /// Every generated ISBN-10 validates and converts to a valid ISBN-13
        #[test]
        fn isbn10_always_converts(isbn in valid_isbn10_strategy()) {
            prop_assert!(is_valid_isbn10(&isbn));
            let converted = isbn10_to_13(&isbn).unwrap();
            prop_assert!(is_valid_isbn13(&converted));
            prop_assert!(converted.starts_with("978"));
        }

        /// ISBN-10 -> ISBN-13 -> ISBN-10 round-trips exactly
        #[test]
        fn conversion_round_trips(isbn in valid_isbn10_strategy()) {
            let thirteen = isbn10_to_13(&isbn).unwrap();
            let ten = isbn13_to_10(&thirteen).unwrap();
            prop_assert_eq!(ten, Some(isbn));
        }

        /// Normalize is idempotent on anything it accepts
        #[test]
        fn normalize_is_idempotent(isbn in valid_isbn13_strategy()) {
            let once = normalize(&isbn).unwrap();
            let twice = normalize(&once).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Normalized output is always canonical 13-digit form
        #[test]
        fn normalized_output_is_canonical(isbn in valid_isbn13_strategy()) {
            let normalized = normalize(&isbn).unwrap();
            prop_assert_eq!(normalized.len(), 13);
            prop_assert!(is_valid_isbn13(&normalized));
        }

        /// 979-prefixed ISBNs never produce an ISBN-10
        #[test]
        fn prefix_979_never_downconverts(digits in prop::collection::vec(0u32..10, 9)) {
            let body: String = digits
                .iter()
                .map(|d| char::from_digit(*d, 10).unwrap())
                .collect();
            let core = format!("979{body}");
            let isbn = format!("{core}{}", isbn13_check_digit(&core));
            prop_assert_eq!(isbn13_to_10(&isbn).unwrap(), None);
        }

        /// Valid ISBNs embedded in text always come back out, normalized
        #[test]
        fn extract_finds_embedded_isbn(isbn in valid_isbn10_strategy()) {
            let text = format!("see ISBN {isbn} for details");
            let found = extract_from_text(&text);
            prop_assert_eq!(found, vec![normalize(&isbn).unwrap()]);
        }
    }
}
