//! gitsme - subject-matter experts from git history
//!
//! Mines a repository's commit history to rank who knows which files and
//! directories best, weighting recent changes more heavily than old ones.

use anyhow::Result;
use clap::Parser;
use gitsme::cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Parse CLI args and run
    let cli = cli::Cli::parse();
    cli::run(cli)
}
