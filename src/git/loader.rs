//! Incremental commit loading
//!
//! A cold load walks the branch history oldest-first and keeps every eligible
//! commit. A warm load walks newest-first from the tip and stops as soon as it
//! reaches the most recent cached commit, which it never re-extracts: the
//! cached prefix of the commit list is append-only, so fresh commits are
//! reversed into chronological order and appended after it.

use git2::{BranchType, Oid, Repository, Sort};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::extract;
use crate::cache::{commits_blob_name, CacheStore};
use crate::error::{Result, SmeError};
use crate::models::{AnalyzeOptions, CommitRecord};

/// Branches tried, in order, when the requested branch does not exist.
const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

/// Per-commit progress signal emitted once for every eligible commit.
///
/// `total` counts all reachable commits (merges included) since that is what
/// is cheap to know up front; `processed` counts eligible commits only.
#[derive(Debug, Clone, Copy)]
pub struct LoadProgress {
    /// Eligible commits extracted during this load.
    pub new_commits: usize,
    /// Cached plus freshly extracted commits.
    pub processed: usize,
    /// All commits reachable from the tip.
    pub total: usize,
}

/// Loads a branch's eligible commit history, reusing the cached commit list
/// when one exists and appending only commits newer than its last entry.
pub struct CommitLoader {
    repo: Repository,
    branch: String,
    requested_branch: String,
    cache: CacheStore,
    commits: Vec<CommitRecord>,
    new_from: usize,
    loaded: bool,
}

impl std::fmt::Debug for CommitLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitLoader")
            .field("branch", &self.branch)
            .field("requested_branch", &self.requested_branch)
            .field("commits", &self.commits.len())
            .field("new_from", &self.new_from)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl CommitLoader {
    /// Open the repository and resolve the branch to walk.
    ///
    /// A missing branch is tolerated: the loader substitutes the first default
    /// branch that exists (or HEAD), and [`CommitLoader::used_fallback_branch`]
    /// reports that the substitution happened.
    pub fn open(options: &AnalyzeOptions) -> Result<Self> {
        let repo = Repository::open(&options.repo).map_err(|source| SmeError::Repository {
            path: options.repo.clone(),
            source,
        })?;
        debug!("Opened git repository at {:?}", repo.path());

        let branch = resolve_branch(&repo, &options.branch);
        let cache = match &options.cache_dir {
            Some(dir) => CacheStore::new(dir.clone(), options.use_cache),
            None => CacheStore::for_repo(&options.repo, options.use_cache),
        };

        Ok(Self {
            repo,
            branch,
            requested_branch: options.branch.clone(),
            cache,
            commits: Vec::new(),
            new_from: 0,
            loaded: false,
        })
    }

    /// The branch actually walked (may differ from the requested one).
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// True when the requested branch did not exist and a default was used.
    pub fn used_fallback_branch(&self) -> bool {
        self.branch != self.requested_branch
    }

    /// Repository root (the working directory, or the gitdir for bare repos).
    pub fn repo_root(&self) -> &Path {
        self.repo.workdir().unwrap_or_else(|| self.repo.path())
    }

    /// The full ordered commit list, oldest first.
    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    /// The suffix of [`CommitLoader::commits`] that this load appended.
    pub fn new_commits(&self) -> &[CommitRecord] {
        &self.commits[self.new_from..]
    }

    pub fn has_new_commits(&self) -> bool {
        self.new_from < self.commits.len()
    }

    /// Load the commit list, reusing the cache when enabled. No-op if already
    /// loaded; use [`CommitLoader::reload`] to force a fresh walk.
    pub fn load(
        &mut self,
        cancel: &AtomicBool,
        progress: impl FnMut(LoadProgress),
    ) -> Result<()> {
        self.load_inner(false, cancel, progress)
    }

    /// Discard any cached prefix and walk the full history again.
    pub fn reload(
        &mut self,
        cancel: &AtomicBool,
        progress: impl FnMut(LoadProgress),
    ) -> Result<()> {
        self.load_inner(true, cancel, progress)
    }

    fn load_inner(
        &mut self,
        force: bool,
        cancel: &AtomicBool,
        mut progress: impl FnMut(LoadProgress),
    ) -> Result<()> {
        if self.loaded && !force {
            return Ok(());
        }

        self.commits = if force {
            Vec::new()
        } else {
            self.cache.load(&commits_blob_name(&self.branch))
        };
        let cached_len = self.commits.len();
        self.new_from = cached_len;

        let tip = self.tip()?;
        if self.commits.last().is_some_and(|last| last.id == tip.to_string()) {
            // Branch tip is already the last cached commit.
            debug!("Commit cache is current at {}", tip);
            self.loaded = true;
            return Ok(());
        }

        let total = self.count_reachable(tip)?;
        let mut walk = self.repo.revwalk()?;
        walk.push(tip)?;

        let mut fresh: Vec<CommitRecord> = Vec::new();

        if cached_len > 0 {
            // Warm load: newest-first, stop at (and exclude) the boundary
            // commit so it is never reprocessed.
            walk.set_sorting(Sort::TIME)?;
            let boundary = Oid::from_str(&self.commits[cached_len - 1].id)?;
            for oid in walk {
                if cancel.load(Ordering::Relaxed) {
                    return Err(SmeError::Cancelled);
                }
                let oid = oid?;
                if oid == boundary {
                    break;
                }
                if let Some(record) = self.extract_eligible(oid)? {
                    fresh.push(record);
                    progress(LoadProgress {
                        new_commits: fresh.len(),
                        processed: cached_len + fresh.len(),
                        total,
                    });
                }
            }
            fresh.reverse();
        } else {
            // Cold load: oldest-first gives the final order directly.
            walk.set_sorting(Sort::TIME | Sort::REVERSE)?;
            for oid in walk {
                if cancel.load(Ordering::Relaxed) {
                    return Err(SmeError::Cancelled);
                }
                let oid = oid?;
                if let Some(record) = self.extract_eligible(oid)? {
                    fresh.push(record);
                    progress(LoadProgress {
                        new_commits: fresh.len(),
                        processed: fresh.len(),
                        total,
                    });
                }
            }
        }

        info!(
            "Loaded {} commits ({} new) on branch {}",
            cached_len + fresh.len(),
            fresh.len(),
            self.branch
        );

        self.commits.extend(fresh);
        self.cache.save(&commits_blob_name(&self.branch), &self.commits)?;
        self.loaded = true;
        Ok(())
    }

    fn extract_eligible(&self, oid: Oid) -> Result<Option<CommitRecord>> {
        let commit = self.repo.find_commit(oid)?;
        if !extract::is_eligible(&commit) {
            return Ok(None);
        }
        Ok(Some(extract::extract(&self.repo, &commit)?))
    }

    fn tip(&self) -> Result<Oid> {
        if let Ok(branch) = self.repo.find_branch(&self.branch, BranchType::Local) {
            if let Some(oid) = branch.get().target() {
                return Ok(oid);
            }
        }
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    /// Cheap oid-only walk so the progress signal can carry a total.
    fn count_reachable(&self, tip: Oid) -> Result<usize> {
        let mut walk = self.repo.revwalk()?;
        walk.push(tip)?;
        Ok(walk.count())
    }
}

fn resolve_branch(repo: &Repository, requested: &str) -> String {
    if repo.find_branch(requested, BranchType::Local).is_ok() {
        return requested.to_string();
    }
    for &fallback in DEFAULT_BRANCHES {
        if fallback != requested && repo.find_branch(fallback, BranchType::Local).is_ok() {
            warn!("Branch '{}' not found; falling back to '{}'", requested, fallback);
            return fallback.to_string();
        }
    }
    warn!("Branch '{}' not found; falling back to HEAD", requested);
    "HEAD".to_string()
}
