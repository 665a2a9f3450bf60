//! Commit extraction: one raw commit + its parent diff -> CommitRecord
//!
//! Total for well-formed single-parent commits; the loader filters out
//! merge and root commits before calling in.

use git2::{Commit, DiffOptions, Patch, Repository};
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{CommitRecord, FileChange};

/// A commit is eligible when it has exactly one parent: merge commits have no
/// unambiguous parent diff and root commits have none at all.
pub fn is_eligible(commit: &Commit) -> bool {
    commit.parent_count() == 1
}

/// Extract a structured record from a single-parent commit.
pub fn extract(repo: &Repository, commit: &Commit) -> Result<CommitRecord> {
    let parent = commit.parent(0)?;
    let tree = commit.tree()?;
    let parent_tree = parent.tree()?;

    let mut diff_opts = DiffOptions::new();
    let diff = repo.diff_tree_to_tree(Some(&parent_tree), Some(&tree), Some(&mut diff_opts))?;

    let mut file_changes: HashMap<String, FileChange> = HashMap::new();
    let mut additions = 0;
    let mut deletions = 0;

    for idx in 0..diff.deltas().len() {
        let Some(patch) = Patch::from_diff(&diff, idx)? else {
            continue; // binary delta, no line stats
        };
        let delta = patch.delta();
        // Delta paths are already repository-relative; deletions only carry
        // the old side.
        let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
            continue;
        };
        let (_context, added, deleted) = patch.line_stats()?;

        let entry = file_changes.entry(path.to_string_lossy().to_string()).or_default();
        entry.additions += added;
        entry.deletions += deleted;
        entry.changes += added + deleted;

        additions += added;
        deletions += deleted;
    }

    Ok(CommitRecord {
        id: commit.id().to_string(),
        timestamp: commit.author().when().seconds(),
        author: contributor_key(commit),
        files_changed: file_changes.len(),
        file_changes,
        additions,
        deletions,
        changes: additions + deletions,
    })
}

/// Canonical contributor key: the local part of the author email, falling back
/// to the author name when no email is recorded. Identical local parts under
/// different domains collide; that is a documented limitation.
fn contributor_key(commit: &Commit) -> String {
    let author = commit.author();
    let identity = author
        .email()
        .filter(|e| !e.is_empty())
        .or_else(|| author.name())
        .unwrap_or("unknown");
    identity.split('@').next().unwrap_or(identity).to_string()
}
