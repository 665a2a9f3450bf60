//! Analyze command: thin wiring of loader -> analyzer -> matcher -> output
//!
//! All business logic lives in the library; this file only compiles filters,
//! drives progress bars, and prints the ranked results.

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::AtomicBool;

use crate::analysis::{query, Analyzer, Matcher};
use crate::cache::CacheStore;
use crate::git::CommitLoader;
use crate::models::AnalyzeOptions;

pub fn run(options: &AnalyzeOptions) -> Result<()> {
    // Compile filters before touching the repository so a malformed pattern
    // fails fast.
    let users = options
        .users
        .iter()
        .map(|u| Matcher::user(u, options.fuzzy))
        .collect::<Result<Vec<_>, _>>()?;
    let files = if options.files.is_empty() && options.users.is_empty() {
        // No filters at all: show the root rollup.
        vec![Matcher::path("/", false)?]
    } else {
        options
            .files
            .iter()
            .map(|f| Matcher::path(f, options.fuzzy))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut loader = CommitLoader::open(options).context("failed to open repository")?;
    println!(
        "Repository: {} (branch: {})",
        loader.repo_root().display(),
        loader.branch()
    );
    if loader.used_fallback_branch() {
        println!(
            "{} branch '{}' not found, using '{}'",
            style("note:").yellow(),
            options.branch,
            loader.branch()
        );
    }

    let load_bar = commit_bar("Loading commits");
    let cancel = AtomicBool::new(false);
    loader.load(&cancel, |p| {
        load_bar.set_length(p.total as u64);
        load_bar.set_position(p.processed as u64);
    })?;
    load_bar.finish_and_clear();
    println!(
        "Commits loaded: {} ({} new)",
        loader.commits().len(),
        loader.new_commits().len()
    );

    let cache = match &options.cache_dir {
        Some(dir) => CacheStore::new(dir.clone(), options.use_cache),
        None => CacheStore::for_repo(&options.repo, options.use_cache),
    };
    let mut analyzer = Analyzer::new(cache, loader.branch());
    let analyze_bar = commit_bar("Analyzing commits");
    analyzer.analyze(&loader, Utc::now().timestamp(), false, |done, total| {
        analyze_bar.set_length(total as u64);
        analyze_bar.set_position(done as u64);
    })?;
    analyze_bar.finish_and_clear();
    println!("Commits analyzed: {}", analyzer.new_commits_processed());
    println!();

    let results = query(analyzer.analysis(), &users, &files, options.top);
    if results.is_empty() {
        println!("No data found!");
        return Ok(());
    }

    for result in &results {
        println!("{}", style(&result.key).cyan().bold());
        for (key, score) in &result.entries {
            println!("  {:<40} {:>12.3}", key, score);
        }
        println!();
    }

    Ok(())
}

fn commit_bar(prefix: &str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_prefix(prefix.to_string());
    if let Ok(tpl) =
        ProgressStyle::with_template("{prefix}: {pos}/{len} ({per_sec}) {wide_bar} {percent}%")
    {
        bar.set_style(tpl);
    }
    bar
}
