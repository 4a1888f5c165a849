//! Catalog search and ISBN extraction commands.

use std::io::Read;

use anyhow::Context;
use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::domain::SearchQuery;
use crate::isbn;

use super::build_service;

/// Search the catalog by title and/or author
pub fn cmd_search(
    rt: &Runtime,
    config: &Config,
    title: Option<&str>,
    author: Option<&str>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    if title.is_none() && author.is_none() {
        eprintln!("Error: provide --title and/or --author");
        std::process::exit(1);
    }

    let service = build_service(config);

    rt.block_on(async {
        let query = SearchQuery {
            title: title.map(String::from),
            author: author.map(String::from),
            limit,
        };

        match service.search_books(&query).await {
            Ok(results) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&results)?);
                    return Ok(());
                }

                if results.is_empty() {
                    println!("No matches found.");
                    return Ok(());
                }

                println!("Found {} result(s):\n", results.len());
                for (i, hit) in results.iter().enumerate() {
                    println!("{:2}. {}", i + 1, hit.title);
                    if !hit.authors.is_empty() {
                        println!("    by {}", hit.authors.join(", "));
                    }
                    let mut details = Vec::new();
                    if let Some(year) = hit.first_publish_year {
                        details.push(format!("first published {year}"));
                    }
                    if let Some(isbn_13) = &hit.isbn_13 {
                        details.push(format!("ISBN {}", isbn::format_isbn13(isbn_13)));
                    }
                    if !details.is_empty() {
                        println!("    {}", details.join(", "));
                    }
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("Search failed: {}", e);
                std::process::exit(1);
            }
        }
    })
}

/// Extract ISBNs from free text (argument or stdin)
pub fn cmd_extract(text: Option<&str>) -> anyhow::Result<()> {
    let content = match text {
        Some(t) => t.to_string(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };

    let found = isbn::extract_from_text(&content);
    if found.is_empty() {
        println!("No ISBNs found.");
        return Ok(());
    }

    println!("Found {} ISBN(s):\n", found.len());
    for isbn_13 in &found {
        println!("  {}  ({})", isbn_13, isbn::format_isbn13(isbn_13));
    }
    Ok(())
}
