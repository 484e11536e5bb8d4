//! Batch coordinator: opens each queued source document, runs the content
//! extractor, and isolates per-item failures.
//!
//! Processing is strictly sequential; the host session is not reentrant, so
//! one open/extract/close cycle completes before the next begins. Locked
//! files are retried through a temporary working copy that is removed on
//! every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::ExportSettings;
use crate::error::{Error, Result};
use crate::host::{ContentExtractor, DocumentHost, SourceDocument};
use crate::item::ExportItem;
use crate::progress::ProgressReporter;
use crate::record::{csv_header, CsvRecord, ItemFailure, RecordMeta};

/// Subfolder (next to the original) that holds working copies of locked
/// files while they are being processed.
pub const WORKING_COPY_DIR: &str = "_export_copies";

/// One fresh record, paired with the index of the item that produced it so
/// the planner can key the cache entry by that item's own cache key.
#[derive(Debug)]
pub struct BatchRecord {
    /// Index into the item slice handed to [`BatchCoordinator::process`].
    pub item_index: usize,
    /// The freshly extracted record.
    pub record: CsvRecord,
}

/// Outcome of one batch: fresh records plus isolated failures.
#[derive(Debug, Default)]
pub struct BatchOutput {
    /// Records in processing order.
    pub records: Vec<BatchRecord>,
    /// Per-item failures; never aborts the batch.
    pub failures: Vec<ItemFailure>,
}

/// Drives the open → extract → close cycle over a batch of items.
pub struct BatchCoordinator<'a, H, E>
where
    H: DocumentHost,
    E: ContentExtractor<H::Doc>,
{
    host: &'a H,
    extractor: &'a E,
    progress: &'a dyn ProgressReporter,
}

impl<'a, H, E> BatchCoordinator<'a, H, E>
where
    H: DocumentHost,
    E: ContentExtractor<H::Doc>,
{
    /// Create a coordinator over the given host session and extractor.
    pub fn new(host: &'a H, extractor: &'a E, progress: &'a dyn ProgressReporter) -> Self {
        Self {
            host,
            extractor,
            progress,
        }
    }

    /// Process every item in order.
    ///
    /// Failures are collected per item; cancellation is honored at item
    /// boundaries and returns whatever completed so far.
    pub fn process(&self, items: &[ExportItem], settings: &ExportSettings) -> BatchOutput {
        log::info!("Starting batch of {} items", items.len());
        let mut output = BatchOutput::default();

        for (index, item) in items.iter().enumerate() {
            if self.progress.is_cancelled() {
                log::info!("Batch cancelled by user after {} items", index);
                break;
            }

            let label = item
                .cache_key()
                .unwrap_or_else(|| item.reference_name.clone());
            self.progress.update(
                index + 1,
                items.len(),
                &format!("Processing {} ({}/{})", label, index + 1, items.len()),
            );

            match self.process_item(item, settings) {
                Ok(record) => output.records.push(BatchRecord {
                    item_index: index,
                    record,
                }),
                Err(err) => {
                    log::error!("Item {} failed: {}", label, err);
                    output.failures.push(ItemFailure::new(label, err.to_string()));
                },
            }
        }
        output
    }

    fn process_item(&self, item: &ExportItem, settings: &ExportSettings) -> Result<CsvRecord> {
        let path = item.source_file.as_deref().ok_or_else(|| {
            Error::SourceNotFound(
                item.cache_key()
                    .unwrap_or_else(|| item.reference_name.clone()),
            )
        })?;

        match self.host.open(path) {
            Ok(doc) => {
                let result = self.extract_record(&doc, item, settings);
                self.host.close(doc);
                result
            },
            Err(err) if err.is_locked() => {
                log::warn!(
                    "{} is locked, retrying via working copy",
                    path.display()
                );
                self.process_via_working_copy(path, item, settings)
            },
            Err(err) => Err(err),
        }
    }

    /// Locked-file recovery: copy the file into a sibling working folder,
    /// extract from the copy, and remove the copy on every exit path.
    fn process_via_working_copy(
        &self,
        original: &Path,
        item: &ExportItem,
        settings: &ExportSettings,
    ) -> Result<CsvRecord> {
        let copy = WorkingCopy::create(original)?;
        let doc = self.host.open(copy.path())?;
        let result = self.extract_record(&doc, item, settings);
        self.host.close(doc);
        result
        // `copy` drops here and deletes the file, success or failure.
    }

    fn extract_record(
        &self,
        doc: &H::Doc,
        item: &ExportItem,
        settings: &ExportSettings,
    ) -> Result<CsvRecord> {
        let lines = self.extractor.extract(doc, &item.page, settings)?;
        let source_name = item
            .source_file
            .as_deref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_else(|| doc.name())
            .to_string();

        Ok(CsvRecord {
            source_name,
            converted_from: item.converted_name.clone(),
            parent_page: item.page.page_number,
            header: csv_header(doc.geometry()),
            meta: RecordMeta {
                produced_at: Utc::now(),
                line_count: lines.lines().count(),
                document_name: doc.name().to_string(),
                layer: settings
                    .layer
                    .clone()
                    .unwrap_or_else(|| "all layers".to_string()),
            },
            lines,
        })
    }
}

/// Scoped working copy of a locked file. Removing the copy is guaranteed on
/// every exit path via `Drop`.
struct WorkingCopy {
    path: PathBuf,
}

impl WorkingCopy {
    fn create(original: &Path) -> Result<Self> {
        let parent = original.parent().ok_or_else(|| Error::OpenFailed {
            path: original.to_path_buf(),
            reason: "no parent directory for working copy".to_string(),
        })?;
        let file_name = original.file_name().ok_or_else(|| Error::OpenFailed {
            path: original.to_path_buf(),
            reason: "no file name for working copy".to_string(),
        })?;

        let dir = parent.join(WORKING_COPY_DIR);
        fs::create_dir_all(&dir)?;

        let path = dir.join(file_name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        fs::copy(original, &path)?;
        log::info!("Created working copy {}", path.display());
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkingCopy {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(err) = fs::remove_file(&self.path) {
                log::warn!(
                    "Could not remove working copy {}: {}",
                    self.path.display(),
                    err
                );
            } else {
                log::debug!("Removed working copy {}", self.path.display());
            }
        }
    }
}
