use super::{CacheStats, ScoreCache};
use crate::errors::{CacheError, CacheResult};
use crate::model::FinalScore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS score_cache (
  content_hash TEXT NOT NULL,
  cache_version INTEGER NOT NULL,
  score_json TEXT NOT NULL,
  created_at TEXT NOT NULL,
  PRIMARY KEY (content_hash, cache_version)
);
";

/// Durable cache shared across processes. Uniqueness of the key is enforced
/// by the primary key, so concurrent writers of the same document race
/// harmlessly: the first insert wins and later ones are ignored.
#[derive(Clone)]
pub struct SqliteScoreCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteScoreCache {
    pub fn open(path: &Path) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        cache.init_schema()?;
        debug!(path = %path.display(), "opened score cache");
        Ok(cache)
    }

    pub fn memory() -> CacheResult<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    pub fn init_schema(&self) -> CacheResult<()> {
        self.lock()?.execute_batch(DDL)?;
        Ok(())
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl ScoreCache for SqliteScoreCache {
    fn get(&self, content_hash: &str, cache_version: u32) -> CacheResult<Option<FinalScore>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT score_json FROM score_cache WHERE content_hash=?1 AND cache_version=?2",
                params![content_hash, cache_version],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    fn put(&self, content_hash: &str, cache_version: u32, score: &FinalScore) -> CacheResult<bool> {
        let json = serde_json::to_string(score)?;
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO score_cache(content_hash, cache_version, score_json, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![content_hash, cache_version, json, super::now_rfc3339()],
        )?;
        Ok(inserted == 1)
    }

    fn purge_other_versions(&self, keep: u32) -> CacheResult<usize> {
        let conn = self.lock()?;
        let n = conn.execute(
            "DELETE FROM score_cache WHERE cache_version <> ?1",
            params![keep],
        )?;
        Ok(n)
    }

    fn stats(&self) -> CacheResult<CacheStats> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT cache_version, COUNT(*) FROM score_cache GROUP BY cache_version ORDER BY cache_version",
        )?;
        let rows = stmt.query_map([], |row| {
            let version: u32 = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((version, count))
        })?;

        let mut stats = CacheStats::default();
        for row in rows {
            let (version, count) = row?;
            let count = usize::try_from(count).map_err(|_| CacheError::Other {
                message: format!("negative entry count for version {}", version),
            })?;
            stats.entries += count;
            stats.by_version.insert(version, count);
        }
        Ok(stats)
    }
}
