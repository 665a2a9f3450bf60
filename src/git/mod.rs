//! Git history access
//!
//! Wraps libgit2 (via the git2 crate) behind two pieces: the incremental
//! [`CommitLoader`], which decides walk direction and termination from what is
//! already cached, and the commit extractor, which turns one raw commit plus
//! its parent diff into a [`crate::models::CommitRecord`].

pub mod extract;
pub mod loader;

pub use loader::{CommitLoader, LoadProgress};
