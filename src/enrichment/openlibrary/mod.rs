//! OpenLibrary catalog integration
//!
//! Fetches bibliographic records by ISBN and searches by title/author.
//! The request flows client -> transport (rate limiting, retries) ->
//! dto (wire shapes) -> adapter (domain conversion).
//!
//! API docs: https://openlibrary.org/dev/docs/api/books

mod adapter;
mod client;
pub mod dto;

pub use client::OpenLibraryClient;

/// Source identifier recorded in metadata, metrics, and cache keys
pub const SOURCE: &str = "openlibrary";
