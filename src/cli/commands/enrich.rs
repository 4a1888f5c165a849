//! Book enrichment commands.

use tokio::runtime::Runtime;

use crate::config::Config;
use crate::enrichment::domain::{EnrichmentResult, EnrichmentStatus};

use super::build_service;

/// Enrich one or more books by ISBN
pub fn cmd_enrich(
    rt: &Runtime,
    config: &Config,
    isbns: &[String],
    force_refresh: bool,
    min_quality: Option<f64>,
    json: bool,
) -> anyhow::Result<()> {
    if let Some(min) = min_quality
        && !(0.0..=1.0).contains(&min)
    {
        eprintln!("Error: --min-quality must be between 0.0 and 1.0");
        std::process::exit(1);
    }

    let service = build_service(config);

    rt.block_on(async {
        if !json && isbns.len() > 1 {
            println!("Enriching {} book(s)...\n", isbns.len());
        }

        let results = service
            .batch_enrich_books(isbns, force_refresh, min_quality)
            .await;

        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if let [result] = results.as_slice() {
            print_single(result);
        } else {
            print_batch(&results);
        }
        Ok(())
    })
}

/// Detailed report for a single enrichment
fn print_single(result: &EnrichmentResult) {
    match result.status {
        EnrichmentStatus::Success => {
            println!(
                "✓ Enriched {} in {:.2}s",
                result.isbn, result.processing_time
            );
        }
        EnrichmentStatus::Partial => {
            println!(
                "? Partial data for {}: {}",
                result.isbn,
                result.error.as_deref().unwrap_or("quality below threshold")
            );
        }
        _ => {
            println!(
                "✗ {}: {}",
                result.isbn,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let Some(metadata) = &result.metadata else {
        return;
    };
    println!();
    println!("  Title:     {}", metadata.title);
    if let Some(subtitle) = &metadata.subtitle {
        println!("  Subtitle:  {}", subtitle);
    }
    if !metadata.authors.is_empty() {
        println!("  Authors:   {}", metadata.authors.join(", "));
    }
    match (metadata.publication_year, &metadata.publisher) {
        (Some(year), Some(publisher)) => println!("  Published: {} ({})", year, publisher),
        (Some(year), None) => println!("  Published: {}", year),
        (None, Some(publisher)) => println!("  Publisher: {}", publisher),
        (None, None) => {}
    }
    if let Some(pages) = metadata.page_count {
        println!("  Pages:     {}", pages);
    }
    if let Some(language) = &metadata.language {
        println!("  Language:  {}", language);
    }
    if let Some(isbn_10) = &metadata.isbn_10 {
        println!("  ISBN-10:   {}", isbn_10);
    }
    if !metadata.subjects.is_empty() {
        println!("  Subjects:  {}", metadata.subjects.join(", "));
    }
    println!("  Quality:   {:.2}", metadata.quality_score);
    if let Some(cover) = &metadata.cover_image_url {
        println!("  Cover:     {}", cover);
    }

    if result.sources_used.iter().any(|s| s.ends_with(":cached")) {
        println!();
        println!("  (served from cache)");
    }
}

/// One line per book plus a closing summary
fn print_batch(results: &[EnrichmentResult]) {
    let total = results.len();
    let mut success = 0usize;
    let mut partial = 0usize;
    let mut failed = 0usize;

    for (i, result) in results.iter().enumerate() {
        print!("[{}/{}] {}... ", i + 1, total, result.isbn);
        match result.status {
            EnrichmentStatus::Success => {
                println!("✓ {}", title_of(result));
                success += 1;
            }
            EnrichmentStatus::Partial => {
                println!(
                    "? {} (quality {:.2})",
                    title_of(result),
                    result.quality_score.unwrap_or(0.0)
                );
                partial += 1;
            }
            _ => {
                println!("✗ {}", result.error.as_deref().unwrap_or("unknown error"));
                failed += 1;
            }
        }
    }

    println!();
    println!(
        "Done! {} enriched, {} partial, {} failed",
        success, partial, failed
    );
}

fn title_of(result: &EnrichmentResult) -> &str {
    result
        .metadata
        .as_ref()
        .map(|m| m.title.as_str())
        .unwrap_or("?")
}
