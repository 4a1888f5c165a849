//! CLI command definitions and dispatch.
//!
//! Each subcommand is implemented in its own submodule:
//! - `enrich`: single and batch ISBN enrichment
//! - `search`: title/author search and ISBN extraction from text
//! - `health`: catalog health probe and recent call metrics

mod enrich;
mod health;
mod search;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::enrichment::openlibrary::OpenLibraryClient;
use crate::enrichment::service::EnrichmentService;

pub use enrich::cmd_enrich;
pub use health::cmd_health;
pub use search::{cmd_extract, cmd_search};

/// Book metadata enrichment from the command line
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Override the OpenLibrary base URL
    #[arg(long, global = true, env = "OPENLIBRARY_BASE_URL")]
    pub base_url: Option<String>,

    /// Load configuration from a specific file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Enrich one or more books by ISBN
    Enrich {
        /// ISBNs to enrich (ISBN-10 or ISBN-13, hyphens welcome)
        #[arg(required = true)]
        isbns: Vec<String>,
        /// Skip the cache and refetch from the catalog
        #[arg(long)]
        force_refresh: bool,
        /// Minimum quality score to accept (0.0-1.0)
        #[arg(long)]
        min_quality: Option<f64>,
        /// Emit results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Search the catalog by title and/or author
    Search {
        /// Title words to search for
        #[arg(short, long)]
        title: Option<String>,
        /// Author name to search for
        #[arg(short, long)]
        author: Option<String>,
        /// Maximum number of results (1-100)
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Emit results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Extract ISBNs from free text
    Extract {
        /// Text to scan; reads stdin when omitted
        text: Option<String>,
    },
    /// Check catalog health and recent call metrics
    Health {
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new().context("Failed to create async runtime")?;

    let mut config = match &cli.config {
        Some(path) => config::load_from(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => config::load(),
    };
    if let Some(base_url) = &cli.base_url {
        config.openlibrary.base_url = base_url.clone();
    }

    match &cli.command {
        Commands::Enrich {
            isbns,
            force_refresh,
            min_quality,
            json,
        } => cmd_enrich(&rt, &config, isbns, *force_refresh, *min_quality, *json),
        Commands::Search {
            title,
            author,
            limit,
            json,
        } => cmd_search(&rt, &config, title.as_deref(), author.as_deref(), *limit, *json),
        Commands::Extract { text } => cmd_extract(text.as_deref()),
        Commands::Health { json } => cmd_health(&rt, &config, *json),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Build the enrichment service from loaded settings
pub(crate) fn build_service(config: &Config) -> EnrichmentService<OpenLibraryClient> {
    let client = OpenLibraryClient::new(config.openlibrary.transport_config());
    EnrichmentService::new(client, config.enrichment.service_config())
}
