//! Incremental planner: decides cache-hit vs. must-process per item, hands
//! the changed items to the batch coordinator, and merges fresh results back
//! into the cache.
//!
//! The cache map is owned exclusively by the planner for the run's duration.
//! It is read once before any work and persisted exactly once at run end, so
//! a crash mid-run leaves the prior snapshot intact.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, CacheStore};
use crate::config::ExportSettings;
use crate::coordinator::BatchCoordinator;
use crate::error::Result;
use crate::host::{ContentExtractor, DocumentHost};
use crate::item::ExportItem;
use crate::locator::FileLocator;
use crate::progress::ProgressReporter;
use crate::record::{ItemFailure, RunResult};

/// Orchestrates one export run.
pub struct IncrementalPlanner<'a, H, E>
where
    H: DocumentHost,
    E: ContentExtractor<H::Doc>,
{
    locator: &'a FileLocator,
    store: &'a CacheStore,
    coordinator: &'a BatchCoordinator<'a, H, E>,
    progress: &'a dyn ProgressReporter,
}

impl<'a, H, E> IncrementalPlanner<'a, H, E>
where
    H: DocumentHost,
    E: ContentExtractor<H::Doc>,
{
    /// Create a planner over the given locator, cache store and coordinator.
    pub fn new(
        locator: &'a FileLocator,
        store: &'a CacheStore,
        coordinator: &'a BatchCoordinator<'a, H, E>,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            locator,
            store,
            coordinator,
            progress,
        }
    }

    /// Run the full incremental pipeline: staleness check per item, batch
    /// processing of what changed, cache merge, single cache persist.
    ///
    /// Records are returned in planning order: cache hits as they are
    /// encountered, fresh records appended in processing order.
    pub fn run(&self, items: Vec<ExportItem>, settings: &ExportSettings) -> RunResult {
        log::info!("Planning {} items against the cache", items.len());
        let mut cache = self.store.load();

        let mut result = RunResult::default();
        // Items queued for fresh processing, with the key and modification
        // time captured at planning time.
        let mut queued_keys: Vec<(String, DateTime<Utc>)> = Vec::new();
        let mut queued_items: Vec<ExportItem> = Vec::new();
        let total = items.len();
        let mut cancelled = false;

        for (index, mut item) in items.into_iter().enumerate() {
            if self.progress.is_cancelled() {
                log::info!("Cache check cancelled by user after {} items", index);
                cancelled = true;
                break;
            }

            let Some(key) = item.cache_key() else {
                log::warn!(
                    "Cannot derive cache key for '{}', skipping",
                    item.reference_name
                );
                result.failures.push(ItemFailure::new(
                    item.reference_name.clone(),
                    "cache key could not be derived",
                ));
                continue;
            };
            self.progress.update(
                index + 1,
                total,
                &format!("Checking {} ({}/{})", key, index + 1, total),
            );

            // A still-valid last-known path skips the fallback search; that
            // is the main cost saving of the cache.
            let remembered = cache
                .get(&key)
                .map(|entry| entry.last_known_path.clone())
                .filter(|path| path.is_file());
            let resolved = match remembered {
                Some(path) => {
                    log::debug!("{} found via cached path {}", key, path.display());
                    Some(path)
                },
                None => item.expected_path().and_then(|p| self.locator.resolve(&p)),
            };
            let Some(path) = resolved else {
                result
                    .failures
                    .push(ItemFailure::new(key, "source file not found"));
                continue;
            };

            let modified = match file_modified_utc(&path) {
                Ok(modified) => modified,
                Err(err) => {
                    result.failures.push(ItemFailure::new(key, err.to_string()));
                    continue;
                },
            };

            // Equal timestamps count as a hit; only strictly newer source
            // files are stale. This is a compatibility contract.
            if let Some(entry) = cache.get(&key) {
                if entry.last_modified >= modified {
                    log::info!("{} unchanged, using cached record", key);
                    result.records.push(entry.record.clone());
                    continue;
                }
                log::info!("{} changed, queuing for processing", key);
            } else {
                log::info!("{} is new, queuing for processing", key);
            }

            item.source_file = Some(path);
            queued_keys.push((key, modified));
            queued_items.push(item);
        }

        if cancelled {
            // Already-collected cache hits survive; nothing fresh ran, so
            // the on-disk snapshot stays untouched.
            return result;
        }

        let batch = self.coordinator.process(&queued_items, settings);

        for fresh in batch.records {
            let (key, modified) = &queued_keys[fresh.item_index];
            match queued_items[fresh.item_index].source_file.as_ref() {
                Some(path) => {
                    log::debug!("Cache entry written for '{}'", key);
                    cache.insert(
                        key.clone(),
                        CacheEntry {
                            last_modified: *modified,
                            last_known_path: path.clone(),
                            record: fresh.record.clone(),
                        },
                    );
                },
                None => log::warn!("No resolved path for '{}', not cached", key),
            }
            result.records.push(fresh.record);
        }
        result.failures.extend(batch.failures);

        // Best effort: a failed cache write is logged, the output is still
        // produced from what this run computed.
        if let Err(err) = self.store.save(&cache) {
            log::error!("Cache snapshot could not be written: {}", err);
        }

        result
    }

    /// Full scan without cache reads or writes: resolve every item and
    /// process all of them.
    pub fn run_uncached(&self, items: Vec<ExportItem>, settings: &ExportSettings) -> RunResult {
        log::info!("Cache disabled, running a full scan of {} items", items.len());
        let mut result = RunResult::default();
        let mut queued_items = Vec::new();

        for mut item in items {
            let label = item
                .cache_key()
                .unwrap_or_else(|| item.reference_name.clone());
            let resolved = item.expected_path().and_then(|p| self.locator.resolve(&p));
            let Some(path) = resolved else {
                result
                    .failures
                    .push(ItemFailure::new(label, "source file not found"));
                continue;
            };
            item.source_file = Some(path);
            queued_items.push(item);
        }

        let batch = self.coordinator.process(&queued_items, settings);
        result.records = batch.records.into_iter().map(|r| r.record).collect();
        result.failures.extend(batch.failures);
        result
    }
}

/// Modification time of a file as UTC.
fn file_modified_utc(path: &Path) -> Result<DateTime<Utc>> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(DateTime::<Utc>::from(modified))
}
