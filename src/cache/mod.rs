//! Persistent blob store for commit lists and aggregates
//!
//! Each blob is a JSON file wrapped in a versioned envelope. Reads are
//! infallible from the caller's point of view: a missing, unreadable,
//! malformed, or version-mismatched blob reads as the empty default, with a
//! warning logged. An incremental merge on top of wrong data would be worse
//! than a full recompute.

pub mod paths;

pub use paths::{analysis_blob_name, commits_blob_name, repo_cache_dir};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// Bump when the shape of any cached blob changes; older blobs are discarded.
pub const CACHE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    version: u32,
    saved_at: i64,
    data: T,
}

/// Keyed blob storage for one repository's cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    enabled: bool,
}

impl CacheStore {
    /// Store rooted at the per-repo directory under the user cache root.
    pub fn for_repo(repo_path: &Path, enabled: bool) -> Self {
        Self::new(repo_cache_dir(repo_path), enabled)
    }

    /// Store rooted at an explicit directory.
    pub fn new(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Load a blob, or the default value when disabled, absent, or unusable.
    pub fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        if !self.enabled {
            return T::default();
        }
        let path = self.dir.join(name);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                warn!("Unreadable cache blob {}: {}; treating as empty", path.display(), e);
                return T::default();
            }
        };
        match serde_json::from_str::<Envelope<T>>(&raw) {
            Ok(envelope) if envelope.version == CACHE_VERSION => {
                debug!("Loaded cache blob {}", path.display());
                envelope.data
            }
            Ok(envelope) => {
                warn!(
                    "Cache blob {} has version {} (expected {}); treating as empty",
                    path.display(),
                    envelope.version,
                    CACHE_VERSION
                );
                T::default()
            }
            Err(e) => {
                warn!("Corrupt cache blob {}: {}; treating as empty", path.display(), e);
                T::default()
            }
        }
    }

    /// Save a blob, overwriting any previous value. No-op when disabled.
    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)?;
        let envelope = Envelope {
            version: CACHE_VERSION,
            saved_at: Utc::now().timestamp(),
            data,
        };
        let path = self.dir.join(name);
        let json = serde_json::to_string(&envelope).map_err(std::io::Error::other)?;
        fs::write(&path, json)?;
        debug!("Saved cache blob {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Analysis;
    use tempfile::tempdir;

    #[test]
    fn round_trips_an_analysis() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf(), true);

        let mut analysis = Analysis::default();
        analysis.record("alice", "/src", 4.5);
        store.save("analysis-main.json", &analysis).unwrap();

        let loaded: Analysis = store.load("analysis-main.json");
        assert_eq!(loaded, analysis);
    }

    #[test]
    fn missing_blob_reads_as_default() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf(), true);
        let loaded: Analysis = store.load("analysis-main.json");
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_blob_reads_as_default() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("analysis-main.json"), "{not json").unwrap();
        let store = CacheStore::new(dir.path().to_path_buf(), true);
        let loaded: Analysis = store.load("analysis-main.json");
        assert!(loaded.is_empty());
    }

    #[test]
    fn version_mismatch_reads_as_default() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf(), true);

        let mut analysis = Analysis::default();
        analysis.record("alice", "/src", 1.0);
        store.save("analysis-main.json", &analysis).unwrap();

        // Rewrite the envelope with a bad version.
        let path = dir.path().join("analysis-main.json");
        let raw = std::fs::read_to_string(&path).unwrap();
        let bumped = raw.replacen("\"version\":1", "\"version\":999", 1);
        std::fs::write(&path, bumped).unwrap();

        let loaded: Analysis = store.load("analysis-main.json");
        assert!(loaded.is_empty());
    }

    #[test]
    fn disabled_store_neither_saves_nor_loads() {
        let dir = tempdir().unwrap();
        let store = CacheStore::new(dir.path().to_path_buf(), false);

        let mut analysis = Analysis::default();
        analysis.record("alice", "/src", 1.0);
        store.save("analysis-main.json", &analysis).unwrap();
        assert!(!dir.path().join("analysis-main.json").exists());

        let loaded: Analysis = store.load("analysis-main.json");
        assert!(loaded.is_empty());
    }
}
