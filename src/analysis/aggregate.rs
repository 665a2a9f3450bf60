//! Weighted aggregation and incremental merging
//!
//! Every file change contributes its change count, attenuated by the age of
//! the commit, to the file's path and every ancestor directory up to `/`.
//! Aggregates over disjoint commit slices combine by summed merge, so a run
//! only has to aggregate the commits that are new since the last cached
//! analysis.
//!
//! Scores cached by an earlier run keep that run's decay curve; merging adds
//! the fresh run's curve on top. That drift is an accepted recency bias --
//! a forced recompute puts the whole history back on a single curve.

use tracing::info;

use crate::cache::{analysis_blob_name, CacheStore};
use crate::error::Result;
use crate::git::CommitLoader;
use crate::models::{Analysis, CommitRecord};

/// Decay multiplier for a commit `time_delta` seconds old.
///
/// Inverse cube root: sub-linear falloff, so very old but large commits still
/// register. Zero and negative deltas (clock skew) both weigh 1.0.
pub fn decay_weight(time_delta: i64) -> f64 {
    if time_delta > 0 {
        (time_delta as f64).powf(-1.0 / 3.0)
    } else {
        1.0
    }
}

/// All aggregate keys a file change rolls up to: the root, every ancestor
/// directory, and the file itself, each as an exact `/`-prefixed path.
pub fn affected_paths(file_path: &str) -> Vec<String> {
    let mut paths = vec!["/".to_string()];
    let mut prefix = String::new();
    for part in file_path.split('/').filter(|p| !p.is_empty()) {
        prefix.push('/');
        prefix.push_str(part);
        paths.push(prefix.clone());
    }
    paths
}

/// Aggregate a slice of commits into mirrored contributor/path score maps.
///
/// Deterministic given `commits` and `now`; `now` is supplied by the caller so
/// one run uses a single clock reading for every commit it processes.
pub fn aggregate(
    commits: &[CommitRecord],
    now: i64,
    mut progress: impl FnMut(usize, usize),
) -> Analysis {
    let mut analysis = Analysis::default();
    let total = commits.len();

    for (idx, commit) in commits.iter().enumerate() {
        let weight = decay_weight(now - commit.timestamp);
        for (file, change) in &commit.file_changes {
            let value = change.changes as f64 * weight;
            for path in affected_paths(file) {
                analysis.record(&commit.author, &path, value);
            }
        }
        progress(idx + 1, total);
    }

    analysis
}

/// Drives aggregation against the analysis cache: a cold run aggregates the
/// full commit list, a warm run aggregates only the loader's new commits and
/// merges them into the cached aggregate.
pub struct Analyzer {
    cache: CacheStore,
    branch: String,
    analysis: Analysis,
    analyzed: bool,
    new_commits_processed: usize,
}

impl Analyzer {
    pub fn new(cache: CacheStore, branch: &str) -> Self {
        Self {
            cache,
            branch: branch.to_string(),
            analysis: Analysis::default(),
            analyzed: false,
            new_commits_processed: 0,
        }
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed
    }

    /// Commits aggregated by the most recent [`Analyzer::analyze`] call.
    pub fn new_commits_processed(&self) -> usize {
        self.new_commits_processed
    }

    /// Produce the up-to-date aggregate for the loader's commit list.
    ///
    /// The cached aggregate is merged with, never recomputed, unless `force`
    /// is set or the loader did a cold load (in which case merging would
    /// double-count and the full list is aggregated instead).
    pub fn analyze(
        &mut self,
        loader: &CommitLoader,
        now: i64,
        force: bool,
        progress: impl FnMut(usize, usize),
    ) -> Result<()> {
        if self.analyzed && !force {
            return Ok(());
        }

        let blob = analysis_blob_name(&self.branch);
        let mut cached: Analysis = if force { Analysis::default() } else { self.cache.load(&blob) };

        let full = loader.commits();
        let new = loader.new_commits();
        let had_cached_prefix = new.len() < full.len();

        self.analysis = if cached.is_empty() || !had_cached_prefix {
            self.new_commits_processed = full.len();
            info!("Aggregating full history ({} commits)", full.len());
            aggregate(full, now, progress)
        } else {
            self.new_commits_processed = new.len();
            info!(
                "Merging {} new commits into cached aggregate ({} contributors)",
                new.len(),
                cached.by_contributor.len()
            );
            let fresh = aggregate(new, now, progress);
            cached.merge(fresh);
            cached
        };

        self.cache.save(&blob, &self.analysis)?;
        self.analyzed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileChange;
    use std::collections::HashMap;

    fn record(id: &str, author: &str, timestamp: i64, files: &[(&str, usize)]) -> CommitRecord {
        let mut file_changes = HashMap::new();
        let mut changes = 0;
        for (path, n) in files {
            file_changes.insert(
                (*path).to_string(),
                FileChange { additions: *n, deletions: 0, changes: *n },
            );
            changes += n;
        }
        CommitRecord {
            id: id.to_string(),
            timestamp,
            author: author.to_string(),
            files_changed: file_changes.len(),
            file_changes,
            additions: changes,
            deletions: 0,
            changes,
        }
    }

    fn score(analysis: &Analysis, path: &str, author: &str) -> f64 {
        analysis
            .by_path
            .get(path)
            .and_then(|m| m.get(author))
            .copied()
            .unwrap_or(0.0)
    }

    #[test]
    fn decay_weight_boundary_is_one() {
        assert_eq!(decay_weight(0), 1.0);
        assert_eq!(decay_weight(-100), 1.0);
        assert!(decay_weight(1) <= 1.0);
    }

    #[test]
    fn decay_weight_is_strictly_monotonic() {
        // Same change magnitude, older commit weighs strictly less.
        assert!(decay_weight(1000) > decay_weight(2000));
        assert!(decay_weight(2000) > decay_weight(1_000_000));
    }

    #[test]
    fn affected_paths_covers_every_ancestor() {
        assert_eq!(
            affected_paths("src/lib/foo.ext"),
            vec!["/", "/src", "/src/lib", "/src/lib/foo.ext"]
        );
        assert_eq!(affected_paths("README.md"), vec!["/", "/README.md"]);
    }

    #[test]
    fn rollup_produces_exactly_the_ancestor_entries() {
        let commits = vec![record("c1", "alice", 1000, &[("src/lib/foo.ext", 10)])];
        let now = 2000;
        let w = decay_weight(1000);
        let analysis = aggregate(&commits, now, |_, _| {});

        assert_eq!(analysis.by_path.len(), 4);
        for path in ["/", "/src", "/src/lib", "/src/lib/foo.ext"] {
            assert!((score(&analysis, path, "alice") - 10.0 * w).abs() < 1e-12);
        }
    }

    #[test]
    fn sibling_files_sum_into_shared_ancestors() {
        let commits = vec![record(
            "c1",
            "alice",
            0,
            &[("src/a.ext", 3), ("src/b.ext", 4)],
        )];
        let analysis = aggregate(&commits, 0, |_, _| {});

        assert_eq!(score(&analysis, "/src/a.ext", "alice"), 3.0);
        assert_eq!(score(&analysis, "/src/b.ext", "alice"), 4.0);
        assert_eq!(score(&analysis, "/src", "alice"), 7.0);
        assert_eq!(score(&analysis, "/", "alice"), 7.0);
    }

    #[test]
    fn transpose_invariant_holds() {
        let commits = vec![
            record("c1", "alice", 500, &[("src/a.ext", 3)]),
            record("c2", "bob", 1500, &[("src/a.ext", 2), ("docs/b.md", 6)]),
        ];
        let analysis = aggregate(&commits, 2000, |_, _| {});

        for contributor in analysis.by_contributor.keys() {
            let paths = analysis.by_contributor.get(contributor).unwrap();
            for (path, value) in paths {
                let mirrored = analysis.by_path.get(path).and_then(|m| m.get(contributor));
                assert_eq!(mirrored, Some(value));
            }
        }
    }

    #[test]
    fn end_to_end_weights_match_hand_computation() {
        // commit1 at t=1000 touches x.ext (+5/-0); commit2 at t=2000 touches
        // x.ext (+0/-5) and y.ext (+2/-0). now=2000 puts commit2 exactly on
        // the zero-delta boundary, so its weight is 1.0.
        let c1 = record("c1", "alice", 1000, &[("x.ext", 5)]);
        let mut c2 = record("c2", "alice", 2000, &[("y.ext", 2)]);
        c2.file_changes.insert(
            "x.ext".to_string(),
            FileChange { additions: 0, deletions: 5, changes: 5 },
        );
        c2.files_changed = 2;
        c2.deletions = 5;
        c2.changes = 7;

        let now = 2000;
        let w1 = decay_weight(1000);
        let analysis = aggregate(&[c1, c2], now, |_, _| {});

        let x = score(&analysis, "/x.ext", "alice");
        let y = score(&analysis, "/y.ext", "alice");
        let root = score(&analysis, "/", "alice");
        assert!((x - (5.0 * w1 + 5.0)).abs() < 1e-12);
        assert!((y - 2.0).abs() < 1e-12);
        assert!((root - (x + y)).abs() < 1e-12);
    }

    #[test]
    fn incremental_merge_equals_full_aggregation() {
        let commits = vec![
            record("c1", "alice", 100, &[("src/a.ext", 3)]),
            record("c2", "bob", 900, &[("src/a.ext", 2), ("docs/b.md", 6)]),
            record("c3", "alice", 1500, &[("docs/b.md", 1)]),
            record("c4", "carol", 1900, &[("src/lib/c.ext", 8)]),
        ];
        let now = 2000;

        let whole = aggregate(&commits, now, |_, _| {});
        for split in 0..=commits.len() {
            let mut merged = aggregate(&commits[..split], now, |_, _| {});
            merged.merge(aggregate(&commits[split..], now, |_, _| {}));
            assert_eq!(merged, whole, "split at {}", split);
        }
    }

    #[test]
    fn progress_fires_once_per_commit() {
        let commits = vec![
            record("c1", "alice", 100, &[("a", 1)]),
            record("c2", "alice", 200, &[("a", 1)]),
        ];
        let mut calls = Vec::new();
        aggregate(&commits, 300, |done, total| calls.push((done, total)));
        assert_eq!(calls, vec![(1, 2), (2, 2)]);
    }
}
