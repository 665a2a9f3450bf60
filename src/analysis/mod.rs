//! Commit analysis: decayed-weight aggregation, incremental merging, and
//! filter matching over the resulting contributor/path score maps.

pub mod aggregate;
pub mod matcher;

pub use aggregate::{affected_paths, aggregate, decay_weight, Analyzer};
pub use matcher::{matching_keys, query, rank, Matcher, QueryResult};
