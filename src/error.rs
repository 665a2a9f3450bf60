//! Error taxonomy for gitsme
//!
//! Fatal conditions (bad repository path, malformed filter pattern) get their
//! own variants so the CLI can report them before any walking begins. Branch
//! fallback and unreadable caches are deliberately *not* errors; they are
//! tolerated and logged where they occur.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmeError {
    /// The given path does not resolve to a git repository.
    #[error("not a git repository: {path} ({source})")]
    Repository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// A filter pattern failed to compile under fuzzy mode.
    #[error("invalid filter pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An underlying git operation failed mid-walk.
    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),

    /// Writing a cache blob failed. Reads never error; a bad cache reads as empty.
    #[error("failed to write cache: {0}")]
    Cache(#[from] std::io::Error),

    /// The walk was cancelled via the cooperative cancellation flag.
    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SmeError>;
