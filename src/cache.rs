//! Persistent cache of extraction results, keyed by item cache key.
//!
//! One JSON snapshot file per run-day; the newest file by name is the
//! current snapshot. The map is loaded once at run start and rewritten in
//! full at run end. A corrupt snapshot degrades to "process everything",
//! never to a crash.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::CsvRecord;

/// Prefix of cache snapshot file names; the suffix is an ISO date.
pub const CACHE_FILE_PREFIX: &str = "catalog_export_cache_";

/// The in-memory cache: key to entry, insertion-ordered for deterministic
/// snapshots.
pub type CacheMap = IndexMap<String, CacheEntry>;

/// One persisted cache entry.
///
/// Created or overwritten only after a successful extraction, never
/// partially written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Modification time of the source file when it was last processed.
    pub last_modified: DateTime<Utc>,

    /// Absolute path the source file was last seen at. Lets the next run
    /// skip the fallback search when the file has not moved.
    pub last_known_path: PathBuf,

    /// The extraction result, reused verbatim on a cache hit.
    pub record: CsvRecord,
}

/// Loads and persists cache snapshots in a fixed directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store over the given snapshot directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the most recent snapshot.
    ///
    /// Returns an empty map when no snapshot exists or the newest one fails
    /// to parse. Individual entries that fail to parse are dropped so one
    /// bad entry only re-processes one item.
    pub fn load(&self) -> CacheMap {
        let Some(path) = self.latest_snapshot() else {
            log::info!("No cache snapshot found, starting with an empty cache");
            return CacheMap::new();
        };

        log::info!("Loading cache from {}", path.display());
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                log::error!("Cache snapshot unreadable, ignoring {}: {}", path.display(), err);
                return CacheMap::new();
            },
        };

        let raw: IndexMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(err) => {
                log::error!("Cache snapshot unparsable, ignoring {}: {}", path.display(), err);
                return CacheMap::new();
            },
        };

        let mut map = CacheMap::with_capacity(raw.len());
        for (key, value) in raw {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => {
                    map.insert(key, entry);
                },
                Err(err) => {
                    log::warn!("Dropping malformed cache entry '{}': {}", key, err);
                },
            }
        }
        map
    }

    /// Persist a full snapshot for today, replacing today's prior snapshot
    /// if one exists.
    ///
    /// The snapshot is written to a temporary sibling file first and renamed
    /// into place, so a failed write leaves the prior on-disk state intact.
    pub fn save(&self, map: &CacheMap) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let stamp = Local::now().format("%Y-%m-%d");
        let target = self.dir.join(format!("{}{}.json", CACHE_FILE_PREFIX, stamp));
        let staging = target.with_extension("json.tmp");

        log::info!("Saving cache to {}", target.display());
        let json = serde_json::to_string_pretty(map)?;
        fs::write(&staging, json)?;
        fs::rename(&staging, &target)?;
        Ok(())
    }

    /// Newest snapshot file by lexicographic name ordering. The date suffix
    /// makes name order equal time order.
    fn latest_snapshot(&self) -> Option<PathBuf> {
        let entries = fs::read_dir(&self.dir).ok()?;
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_snapshot_name(p))
            .max_by(|a, b| a.file_name().cmp(&b.file_name()))
    }
}

fn is_snapshot_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(CACHE_FILE_PREFIX) && n.ends_with(".json"))
}
