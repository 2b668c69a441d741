use super::{CacheEntry, CacheStats, ScoreCache};
use crate::errors::{CacheError, CacheResult};
use crate::model::FinalScore;
use std::collections::HashMap;
use std::sync::RwLock;

type Key = (String, u32);

/// Process-local cache. Reads take a shared lock, so concurrent lookups
/// never serialize behind each other.
#[derive(Debug, Default)]
pub struct MemoryScoreCache {
    entries: RwLock<HashMap<Key, CacheEntry>>,
}

impl MemoryScoreCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreCache for MemoryScoreCache {
    fn get(&self, content_hash: &str, cache_version: u32) -> CacheResult<Option<FinalScore>> {
        let map = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        Ok(map
            .get(&(content_hash.to_string(), cache_version))
            .map(|e| e.score.clone()))
    }

    fn put(&self, content_hash: &str, cache_version: u32, score: &FinalScore) -> CacheResult<bool> {
        let mut map = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        let key = (content_hash.to_string(), cache_version);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(
            key,
            CacheEntry {
                content_hash: content_hash.to_string(),
                cache_version,
                score: score.clone(),
                created_at: super::now_rfc3339(),
            },
        );
        Ok(true)
    }

    fn purge_other_versions(&self, keep: u32) -> CacheResult<usize> {
        let mut map = self.entries.write().map_err(|_| CacheError::Poisoned)?;
        let before = map.len();
        map.retain(|(_, v), _| *v == keep);
        Ok(before - map.len())
    }

    fn stats(&self) -> CacheResult<CacheStats> {
        let map = self.entries.read().map_err(|_| CacheError::Poisoned)?;
        let mut stats = CacheStats {
            entries: map.len(),
            ..CacheStats::default()
        };
        for (_, version) in map.keys() {
            *stats.by_version.entry(*version).or_insert(0) += 1;
        }
        Ok(stats)
    }
}
