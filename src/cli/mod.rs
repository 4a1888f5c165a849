//! Command-line interface for bookfetch.
//!
//! This module provides CLI commands for enriching books by ISBN,
//! searching the catalog, extracting ISBNs from free text, and
//! checking service health.

mod commands;

pub use commands::{Cli, Commands, run_command};
