//! Content-addressed score cache keyed by `(content_hash, cache_version)`.
//!
//! Entries are write-once: a second `put` for a key that already exists is a
//! no-op. Bumping [`CACHE_VERSION`] (or `cache_version` in config) makes every
//! older entry unreachable without deleting it.

mod memory;
mod sqlite;

pub use memory::MemoryScoreCache;
pub use sqlite::SqliteScoreCache;

use crate::errors::CacheResult;
use crate::model::FinalScore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bump when scoring semantics change.
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub content_hash: String,
    pub cache_version: u32,
    pub score: FinalScore,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    /// Entry count per cache version.
    pub by_version: BTreeMap<u32, usize>,
}

pub trait ScoreCache: Send + Sync {
    fn get(&self, content_hash: &str, cache_version: u32) -> CacheResult<Option<FinalScore>>;

    /// Stores `score` unless the key already exists. Returns whether a new
    /// entry was written.
    fn put(&self, content_hash: &str, cache_version: u32, score: &FinalScore) -> CacheResult<bool>;

    /// Deletes every entry whose version differs from `keep`.
    fn purge_other_versions(&self, keep: u32) -> CacheResult<usize>;

    fn stats(&self) -> CacheResult<CacheStats>;
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
