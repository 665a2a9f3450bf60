//! # gitsme
//!
//! Attributes ownership and expertise over a codebase by mining its commit
//! history: for every file and directory, which contributors changed it most,
//! with recent changes weighted more heavily than old ones (inverse-cube-root
//! decay). Commit lists and aggregates are cached per repository and branch,
//! so later runs only process commits that are new since the last run.
//!
//! ## Example
//!
//! ```no_run
//! use gitsme::analysis::{query, Analyzer, Matcher};
//! use gitsme::cache::CacheStore;
//! use gitsme::git::CommitLoader;
//! use gitsme::models::AnalyzeOptions;
//! use std::sync::atomic::AtomicBool;
//!
//! let options = AnalyzeOptions::new("/path/to/repo");
//! let mut loader = CommitLoader::open(&options).unwrap();
//! loader.load(&AtomicBool::new(false), |_| {}).unwrap();
//!
//! let cache = CacheStore::for_repo(&options.repo, options.use_cache);
//! let mut analyzer = Analyzer::new(cache, loader.branch());
//! analyzer.analyze(&loader, chrono::Utc::now().timestamp(), false, |_, _| {}).unwrap();
//!
//! let files = vec![Matcher::path("src", false).unwrap()];
//! for result in query(analyzer.analysis(), &[], &files, 10) {
//!     println!("{}: {:?}", result.key, result.entries);
//! }
//! ```

pub mod analysis;
pub mod cache;
pub mod cli;
pub mod error;
pub mod git;
pub mod models;

pub use error::{Result, SmeError};
pub use models::{Analysis, AnalyzeOptions, CommitRecord, FileChange, ScoreMap};
