//! CLI definition and dispatch

mod analyze;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::models::AnalyzeOptions;

/// Parse and validate the result count (at least 1)
fn parse_top(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("top must be at least 1".to_string())
    } else {
        Ok(n)
    }
}

/// gitsme - subject-matter experts from git history
#[derive(Parser, Debug)]
#[command(name = "gitsme")]
#[command(
    version,
    about = "Rank who knows each file and directory best, from commit history weighted toward recent work",
    long_about = "gitsme walks a branch's commit history, attributes every file change to its \
author with a time-decayed weight, and rolls file scores up to every parent \
directory. Commit lists and aggregates are cached per repository and branch, \
so later runs only process commits made since the last run.",
    after_help = "\
Examples:
  gitsme --repo .                               Top contributors for the whole tree
  gitsme --repo . --file src/parser             Experts for one directory
  gitsme --repo . --user alice                  Where one contributor's expertise lies
  gitsme --repo . --user alice --file src       Both, restricted to each other
  gitsme --repo . --fuzzy --file '\\.rs$'        Regex filters
  gitsme --repo . --ignore-cache                Recompute from the full history"
)]
pub struct Cli {
    /// Path to the git repository
    #[arg(long, short = 'r')]
    pub repo: PathBuf,

    /// Branch to analyze (falls back to main/master if absent)
    #[arg(long, short = 'b', default_value = "main")]
    pub branch: String,

    /// Cache loaded commits and analysis between runs (default)
    #[arg(long, overrides_with = "ignore_cache")]
    pub use_cache: bool,

    /// Ignore any existing cache and do not write one
    #[arg(long, overrides_with = "use_cache")]
    pub ignore_cache: bool,

    /// Limit analysis to this file or directory path (repeatable)
    #[arg(long, short = 'f')]
    pub file: Vec<String>,

    /// Limit analysis to this contributor (repeatable)
    #[arg(long, short = 'u')]
    pub user: Vec<String>,

    /// Treat --file and --user values as regular expressions
    #[arg(long, short = 'z')]
    pub fuzzy: bool,

    /// Number of contributors/paths to show per result
    #[arg(long, short = 't', default_value = "10", value_parser = parse_top)]
    pub top: usize,
}

pub fn run(cli: Cli) -> Result<()> {
    let options = AnalyzeOptions {
        repo: cli.repo,
        branch: cli.branch,
        use_cache: !cli.ignore_cache,
        cache_dir: None,
        users: cli.user,
        files: cli.file,
        fuzzy: cli.fuzzy,
        top: cli.top,
    };
    analyze::run(&options)
}
