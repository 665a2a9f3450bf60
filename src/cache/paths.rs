//! Cache path derivation - uses ~/.cache/gitsme/<repo-hash>/ per repository

use std::path::{Path, PathBuf};

/// Get the cache directory for a repository.
/// Uses ~/.cache/gitsme/<repo-hash>/ on Unix, %LOCALAPPDATA%/gitsme/<repo-hash>/ on Windows.
pub fn repo_cache_dir(repo_path: &Path) -> PathBuf {
    let repo_hash = hash_path(repo_path);

    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("gitsme").join(&repo_hash)
}

/// File name for the cached commit list of a branch.
pub fn commits_blob_name(branch: &str) -> String {
    format!("commits-{}.json", sanitize(branch))
}

/// File name for the cached aggregate of a branch.
pub fn analysis_blob_name(branch: &str) -> String {
    format!("analysis-{}.json", sanitize(branch))
}

/// Branch names may contain `/` (e.g. `release/1.2`); keep them filesystem-safe.
fn sanitize(branch: &str) -> String {
    branch
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '-' })
        .collect()
}

/// Hash a path to create a unique but deterministic directory name.
/// Uses the canonical path so `.` and the absolute path land in the same place.
fn hash_path(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    let mut hasher = DefaultHasher::new();
    path_str.hash(&mut hasher);
    let hash = hasher.finish();

    let repo_name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("repo")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(20)
        .collect::<String>();

    format!("{}-{:012x}", repo_name, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_path_deterministic() {
        let path = Path::new("/tmp/test-repo");
        assert_eq!(hash_path(path), hash_path(path));
    }

    #[test]
    fn test_repo_cache_dir_format() {
        let path = Path::new("/home/user/my-project");
        let cache = repo_cache_dir(path);
        assert!(cache.to_string_lossy().contains("gitsme"));
        assert!(cache.to_string_lossy().contains("my-project"));
    }

    #[test]
    fn test_blob_names_sanitize_branch() {
        assert_eq!(commits_blob_name("main"), "commits-main.json");
        assert_eq!(analysis_blob_name("release/1.2"), "analysis-release-1.2.json");
    }
}
