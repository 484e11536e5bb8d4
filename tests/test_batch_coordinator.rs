//! Integration tests for the batch coordinator: failure isolation,
//! locked-file recovery and cancellation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use catalog_export::coordinator::WORKING_COPY_DIR;
use catalog_export::host::{MockExtractor, MockHost};
use catalog_export::{
    BatchCoordinator, ExportItem, ExportSettings, NoProgress, PageContext, PageSide,
    ProgressReporter,
};

fn item_with_source(name: &str, source: &Path, page: i32) -> ExportItem {
    let mut item = ExportItem::direct(name, source, PageContext::new(page, PageSide::Right));
    item.source_file = Some(source.to_path_buf());
    item
}

/// Reporter that requests cancellation once `limit` updates were seen.
struct CancelAfter {
    limit: usize,
    seen: AtomicUsize,
}

impl CancelAfter {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            seen: AtomicUsize::new(0),
        }
    }
}

impl ProgressReporter for CancelAfter {
    fn update(&self, _current: usize, _total: usize, _message: &str) {
        self.seen.fetch_add(1, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.seen.load(Ordering::SeqCst) >= self.limit
    }
}

#[test]
fn test_all_items_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new()
        .with_document("0100.indd", "G,10,a\n")
        .with_document("0200.indd", "G,11,b\n");
    let extractor = MockExtractor::new();
    let progress = NoProgress;
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    let sources: Vec<PathBuf> = ["0100.indd", "0200.indd"]
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, "stub").unwrap();
            path
        })
        .collect();
    let items = vec![
        item_with_source("0100.indd", &sources[0], 10),
        item_with_source("0200.indd", &sources[1], 11),
    ];

    let output = coordinator.process(&items, &ExportSettings::default());
    assert_eq!(output.records.len(), 2);
    assert!(output.failures.is_empty());
    assert_eq!(output.records[0].item_index, 0);
    assert_eq!(output.records[1].item_index, 1);
    assert!(host.all_closed());
}

#[test]
fn test_one_failure_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    // Only two of the three documents are known to the host.
    let host = MockHost::new()
        .with_document("0100.indd", "G,10,a\n")
        .with_document("0300.indd", "G,12,c\n");
    let extractor = MockExtractor::new();
    let progress = NoProgress;
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    let mut items = Vec::new();
    for (name, page) in [("0100.indd", 10), ("0200.indd", 11), ("0300.indd", 12)] {
        let path = dir.path().join(name);
        fs::write(&path, "stub").unwrap();
        items.push(item_with_source(name, &path, page));
    }

    let output = coordinator.process(&items, &ExportSettings::default());
    assert_eq!(output.records.len(), 2);
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].item, "0200.indd");
    assert!(host.all_closed());
}

#[test]
fn test_extraction_failure_still_closes_document() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new()
        .with_document("0100.indd", "G,10,a\n")
        .with_document("0200.indd", "G,11,b\n");
    let extractor = MockExtractor::new().failing_for("0100.indd");
    let progress = NoProgress;
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    let mut items = Vec::new();
    for (name, page) in [("0100.indd", 10), ("0200.indd", 11)] {
        let path = dir.path().join(name);
        fs::write(&path, "stub").unwrap();
        items.push(item_with_source(name, &path, page));
    }

    let output = coordinator.process(&items, &ExportSettings::default());
    assert_eq!(output.records.len(), 1);
    assert_eq!(output.failures.len(), 1);
    assert!(output.failures[0].reason.contains("scripted failure"));
    // The failing document was opened and must still have been closed.
    assert!(host.all_closed());
}

#[test]
fn test_locked_file_recovers_via_working_copy() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("0100.indd");
    fs::write(&original, "stub").unwrap();

    let host = MockHost::new().with_document("0100.indd", "G,10,a\n");
    host.lock_path(&original);
    let extractor = MockExtractor::new();
    let progress = NoProgress;
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    let items = vec![item_with_source("0100.indd", &original, 10)];
    let output = coordinator.process(&items, &ExportSettings::default());

    // The record was produced from the working copy.
    assert_eq!(output.records.len(), 1);
    assert!(output.failures.is_empty());
    assert_eq!(output.records[0].record.lines, "G,10,a\n");

    // Exactly one successful open: the copy, not the locked original.
    assert_eq!(host.open_count("0100.indd"), 1);
    assert!(host.all_closed());

    // The copy was removed afterwards; the folder may remain.
    let copy = dir.path().join(WORKING_COPY_DIR).join("0100.indd");
    assert!(!copy.exists());
    assert!(original.exists());
}

#[test]
fn test_working_copy_removed_even_when_extraction_fails() {
    let dir = tempfile::tempdir().unwrap();
    let original = dir.path().join("0100.indd");
    fs::write(&original, "stub").unwrap();

    let host = MockHost::new().with_document("0100.indd", "G,10,a\n");
    host.lock_path(&original);
    let extractor = MockExtractor::new().failing_for("0100.indd");
    let progress = NoProgress;
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    let items = vec![item_with_source("0100.indd", &original, 10)];
    let output = coordinator.process(&items, &ExportSettings::default());

    assert!(output.records.is_empty());
    assert_eq!(output.failures.len(), 1);
    let copy = dir.path().join(WORKING_COPY_DIR).join("0100.indd");
    assert!(!copy.exists());
    assert!(host.all_closed());
}

#[test]
fn test_cancellation_stops_at_item_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let host = MockHost::new()
        .with_document("0100.indd", "G,10,a\n")
        .with_document("0200.indd", "G,11,b\n")
        .with_document("0300.indd", "G,12,c\n");
    let extractor = MockExtractor::new();
    let progress = CancelAfter::new(2);
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    let mut items = Vec::new();
    for (name, page) in [("0100.indd", 10), ("0200.indd", 11), ("0300.indd", 12)] {
        let path = dir.path().join(name);
        fs::write(&path, "stub").unwrap();
        items.push(item_with_source(name, &path, page));
    }

    let output = coordinator.process(&items, &ExportSettings::default());

    // Two items completed before the cancellation was observed; the
    // completed records are kept.
    assert_eq!(output.records.len(), 2);
    assert!(output.failures.is_empty());
    assert_eq!(host.open_count("0300.indd"), 0);
}

#[test]
fn test_unresolved_source_becomes_failure() {
    let host = MockHost::new().with_document("0100.indd", "G,10,a\n");
    let extractor = MockExtractor::new();
    let progress = NoProgress;
    let coordinator = BatchCoordinator::new(&host, &extractor, &progress);

    // Item never got a resolved source file.
    let items = vec![ExportItem::direct(
        "0100.indd",
        "/srv/pages/0100.indd",
        PageContext::new(10, PageSide::Right),
    )];
    let output = coordinator.process(&items, &ExportSettings::default());

    assert!(output.records.is_empty());
    assert_eq!(output.failures.len(), 1);
    assert!(output.failures[0].reason.contains("not found"));
}
