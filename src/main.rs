//! bookfetch - Book metadata enrichment from OpenLibrary.
//!
//! Looks up books by ISBN, validates and scores the records it gets
//! back, and reports on catalog health. All commands run from the CLI;
//! caching and rate limiting keep repeated lookups polite and fast.

pub mod cli;
pub mod config;
pub mod enrichment;
pub mod isbn;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("bookfetch=info".parse()?))
        .init();

    cli::run_command(&args)
}
