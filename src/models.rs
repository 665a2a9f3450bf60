//! Core data models for gitsme
//!
//! These models are shared by the loader, the aggregator, and the cache, and
//! all of them serialize so they can round-trip through the blob store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Patch statistics for one file in one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub additions: usize,
    pub deletions: usize,
    pub changes: usize,
}

/// A single eligible commit, immutable once extracted.
///
/// Only commits with exactly one parent are ever materialized: merge commits
/// have no unambiguous parent diff and root commits have none at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub id: String,
    /// Authoring time, seconds since epoch.
    pub timestamp: i64,
    /// Canonical contributor key: the local part of the author email.
    /// Two addresses with the same local part collide by design.
    pub author: String,
    /// Repository-relative path -> patch stats.
    pub file_changes: HashMap<String, FileChange>,
    /// Number of distinct paths touched.
    pub files_changed: usize,
    pub additions: usize,
    pub deletions: usize,
    pub changes: usize,
}

/// Two-level score accumulator: outer key -> inner key -> score.
///
/// Scores are decayed change magnitudes, not counts. Both views of an
/// [`Analysis`] use this same type so accumulation and merging behave
/// identically on each side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreMap(HashMap<String, HashMap<String, f64>>);

impl ScoreMap {
    /// Add `value` to the `(outer, inner)` cell, creating it at zero if absent.
    pub fn add(&mut self, outer: &str, inner: &str, value: f64) {
        *self
            .0
            .entry(outer.to_string())
            .or_default()
            .entry(inner.to_string())
            .or_default() += value;
    }

    /// Sum `fresh` into `self`. Commutative and associative over maps built
    /// from disjoint commit sets, which is what makes repeated incremental
    /// merging equivalent to one aggregation over the full history.
    pub fn merge(&mut self, fresh: ScoreMap) {
        for (outer, inner_map) in fresh.0 {
            match self.0.entry(outer) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(inner_map);
                }
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    for (inner, value) in inner_map {
                        *slot.get_mut().entry(inner).or_default() += value;
                    }
                }
            }
        }
    }

    pub fn get(&self, outer: &str) -> Option<&HashMap<String, f64>> {
        self.0.get(outer)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// The mirrored aggregate maps, always updated together.
///
/// Invariant: `by_contributor[c][p] == by_path[p][c]` for every pair that
/// appears in either map; the two are transposed views of the same
/// weighted-edge set between contributors and paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub by_contributor: ScoreMap,
    pub by_path: ScoreMap,
}

impl Analysis {
    /// Record one weighted contribution, keeping both views in step.
    pub fn record(&mut self, contributor: &str, path: &str, value: f64) {
        self.by_contributor.add(contributor, path, value);
        self.by_path.add(path, contributor, value);
    }

    /// Merge a fresh aggregate (over commits disjoint from this one) into self.
    pub fn merge(&mut self, fresh: Analysis) {
        self.by_contributor.merge(fresh.by_contributor);
        self.by_path.merge(fresh.by_path);
    }

    pub fn is_empty(&self) -> bool {
        self.by_contributor.is_empty() && self.by_path.is_empty()
    }
}

/// Immutable run configuration, constructed once by the caller and passed by
/// reference into each component entry point.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Path to the repository to analyze.
    pub repo: PathBuf,
    /// Requested branch; the loader may fall back to a default branch.
    pub branch: String,
    /// Read and write the commit/analysis caches.
    pub use_cache: bool,
    /// Override for the cache directory (defaults to the per-repo directory
    /// under the user cache root).
    pub cache_dir: Option<PathBuf>,
    /// Contributor filters.
    pub users: Vec<String>,
    /// Path filters.
    pub files: Vec<String>,
    /// Treat user/path filters as regular expressions.
    pub fuzzy: bool,
    /// Results to show per matched key.
    pub top: usize,
}

impl AnalyzeOptions {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            branch: "main".to_string(),
            use_cache: true,
            cache_dir: None,
            users: Vec::new(),
            files: Vec::new(),
            fuzzy: false,
            top: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_map_add_accumulates() {
        let mut map = ScoreMap::default();
        map.add("alice", "/src", 1.5);
        map.add("alice", "/src", 2.5);
        assert_eq!(map.get("alice").and_then(|m| m.get("/src")), Some(&4.0));
    }

    #[test]
    fn score_map_merge_sums_and_inserts() {
        let mut cached = ScoreMap::default();
        cached.add("alice", "/src", 1.0);

        let mut fresh = ScoreMap::default();
        fresh.add("alice", "/src", 2.0);
        fresh.add("bob", "/docs", 3.0);

        cached.merge(fresh);
        assert_eq!(cached.get("alice").and_then(|m| m.get("/src")), Some(&3.0));
        assert_eq!(cached.get("bob").and_then(|m| m.get("/docs")), Some(&3.0));
    }

    #[test]
    fn score_map_merge_is_commutative() {
        let mut a = ScoreMap::default();
        a.add("alice", "/src", 1.0);
        a.add("bob", "/src", 2.0);

        let mut b = ScoreMap::default();
        b.add("alice", "/src", 4.0);
        b.add("carol", "/docs", 8.0);

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);
        assert_eq!(ab, ba);
    }

    #[test]
    fn analysis_record_keeps_transpose_invariant() {
        let mut analysis = Analysis::default();
        analysis.record("alice", "/src/lib.rs", 5.0);
        analysis.record("bob", "/src/lib.rs", 2.0);
        analysis.record("alice", "/", 7.0);

        for (contributor, paths) in [("alice", vec!["/src/lib.rs", "/"]), ("bob", vec!["/src/lib.rs"])] {
            for path in paths {
                let forward = analysis.by_contributor.get(contributor).and_then(|m| m.get(path));
                let backward = analysis.by_path.get(path).and_then(|m| m.get(contributor));
                assert_eq!(forward, backward);
                assert!(forward.is_some());
            }
        }
    }
}
