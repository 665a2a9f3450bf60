//! Filter matching and ranking over aggregate keys
//!
//! Filters match aggregate keys by exact equality; hierarchical rollup means a
//! directory key already carries the sum of everything beneath it, so matching
//! `/src` exactly is how a whole subtree is queried. Fuzzy mode switches both
//! filter kinds to regular expressions, compiled up front so a malformed
//! pattern fails before any walking begins.

use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Result, SmeError};
use crate::models::Analysis;

/// A single compiled filter.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact string equality.
    Exact(String),
    /// Regular expression (fuzzy mode).
    Pattern(Regex),
}

impl Matcher {
    /// Compile a contributor filter.
    pub fn user(input: &str, fuzzy: bool) -> Result<Self> {
        if fuzzy {
            Self::pattern(input)
        } else {
            Ok(Matcher::Exact(input.to_string()))
        }
    }

    /// Compile a path filter. Exact-mode filters get exactly one leading `/`
    /// and no trailing one, so they line up with rollup keys.
    pub fn path(input: &str, fuzzy: bool) -> Result<Self> {
        if fuzzy {
            Self::pattern(input)
        } else {
            let trimmed = input.trim_end_matches('/');
            let normalized = if trimmed.is_empty() {
                "/".to_string()
            } else if trimmed.starts_with('/') {
                trimmed.to_string()
            } else {
                format!("/{trimmed}")
            };
            Ok(Matcher::Exact(normalized))
        }
    }

    fn pattern(input: &str) -> Result<Self> {
        let regex = Regex::new(input).map_err(|source| SmeError::Pattern {
            pattern: input.to_string(),
            source,
        })?;
        Ok(Matcher::Pattern(regex))
    }

    pub fn is_match(&self, key: &str) -> bool {
        match self {
            Matcher::Exact(s) => key == s,
            Matcher::Pattern(r) => r.is_match(key),
        }
    }
}

/// Keys matched by *any* of the matchers, sorted for deterministic output.
pub fn matching_keys<'a>(
    keys: impl Iterator<Item = &'a String>,
    matchers: &[Matcher],
) -> Vec<String> {
    let mut matched: Vec<String> = keys
        .filter(|key| matchers.iter().any(|m| m.is_match(key)))
        .cloned()
        .collect();
    matched.sort();
    matched
}

/// Top `top` entries by descending score; ties break by key ascending so
/// repeated runs produce identical output.
pub fn rank(scores: &HashMap<String, f64>, top: usize) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> =
        scores.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    entries.truncate(top);
    entries
}

/// One matched aggregate key with its ranked counterpart scores.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub key: String,
    pub entries: Vec<(String, f64)>,
}

/// Match the requested filters against the aggregate and rank the results.
///
/// With both contributor and path filters, the output is the restriction of
/// the bipartite aggregate to the cross product, reported from both
/// directions. Keys whose restricted ranking is empty are omitted entirely.
pub fn query(
    analysis: &Analysis,
    users: &[Matcher],
    files: &[Matcher],
    top: usize,
) -> Vec<QueryResult> {
    let matched_users = if users.is_empty() {
        Vec::new()
    } else {
        matching_keys(analysis.by_contributor.keys(), users)
    };
    let matched_files = if files.is_empty() {
        Vec::new()
    } else {
        matching_keys(analysis.by_path.keys(), files)
    };

    let mut results = Vec::new();

    if !matched_users.is_empty() && !matched_files.is_empty() {
        for user in &matched_users {
            if let Some(scores) = analysis.by_contributor.get(user) {
                let restricted: HashMap<String, f64> = scores
                    .iter()
                    .filter(|(path, _)| matched_files.contains(path))
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                push_ranked(&mut results, user, &restricted, top);
            }
        }
        for file in &matched_files {
            if let Some(scores) = analysis.by_path.get(file) {
                let restricted: HashMap<String, f64> = scores
                    .iter()
                    .filter(|(user, _)| matched_users.contains(user))
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                push_ranked(&mut results, file, &restricted, top);
            }
        }
    } else if !matched_users.is_empty() {
        for user in &matched_users {
            if let Some(scores) = analysis.by_contributor.get(user) {
                push_ranked(&mut results, user, scores, top);
            }
        }
    } else {
        for file in &matched_files {
            if let Some(scores) = analysis.by_path.get(file) {
                push_ranked(&mut results, file, scores, top);
            }
        }
    }

    results
}

fn push_ranked(
    results: &mut Vec<QueryResult>,
    key: &str,
    scores: &HashMap<String, f64>,
    top: usize,
) {
    let entries = rank(scores, top);
    if !entries.is_empty() {
        results.push(QueryResult { key: key.to_string(), entries });
    }
}
