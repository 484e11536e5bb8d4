//! Scripted in-memory host for tests.
//!
//! Documents are registered per file name, so a working copy of a locked
//! file (same name, different directory) resolves to the same script. Open
//! failures and locks are scripted per path/name, and every open and close
//! is recorded for assertions.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::{ContentExtractor, DocumentHost, SourceDocument};
use crate::config::ExportSettings;
use crate::error::{Error, Result};
use crate::item::PageContext;
use crate::record::DocumentGeometry;

/// A scripted document handed out by [`MockHost`].
#[derive(Debug, Clone)]
pub struct MockDocument {
    /// File name.
    pub name: String,
    /// Geometry reported to the pipeline.
    pub geometry: DocumentGeometry,
    /// Page count reported to the pipeline.
    pub page_count: u32,
    /// Line block the [`MockExtractor`] returns verbatim.
    pub lines: String,
}

impl SourceDocument for MockDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn geometry(&self) -> &DocumentGeometry {
        &self.geometry
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }
}

/// In-memory host with scripted documents and failures.
#[derive(Debug, Default)]
pub struct MockHost {
    scripts: HashMap<String, MockDocument>,
    locked_paths: RefCell<HashSet<PathBuf>>,
    opens: RefCell<Vec<PathBuf>>,
    closes: RefCell<Vec<String>>,
}

impl MockHost {
    /// Create an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its file name with a canned line block.
    pub fn with_document(mut self, name: &str, lines: &str) -> Self {
        self.scripts.insert(
            name.to_string(),
            MockDocument {
                name: name.to_string(),
                geometry: DocumentGeometry::new(0.0, 0.0, 210.0, 297.0),
                page_count: 1,
                lines: lines.to_string(),
            },
        );
        self
    }

    /// Mark one exact path as locked. Copies of the file at other paths
    /// still open, which is what working-copy recovery relies on.
    pub fn lock_path(&self, path: impl Into<PathBuf>) {
        self.locked_paths.borrow_mut().insert(path.into());
    }

    /// Remove a lock again.
    pub fn unlock_path(&self, path: &Path) {
        self.locked_paths.borrow_mut().remove(path);
    }

    /// Number of successful opens for the given file name.
    pub fn open_count(&self, name: &str) -> usize {
        self.opens
            .borrow()
            .iter()
            .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(name))
            .count()
    }

    /// Whether every successful open was paired with a close.
    pub fn all_closed(&self) -> bool {
        self.opens.borrow().len() == self.closes.borrow().len()
    }
}

impl DocumentHost for MockHost {
    type Doc = MockDocument;

    fn open(&self, path: &Path) -> Result<MockDocument> {
        if self.locked_paths.borrow().contains(path) {
            return Err(Error::SourceLocked {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        let doc = self
            .scripts
            .get(name)
            .cloned()
            .ok_or_else(|| Error::OpenFailed {
                path: path.to_path_buf(),
                reason: "no such document".to_string(),
            })?;
        self.opens.borrow_mut().push(path.to_path_buf());
        Ok(doc)
    }

    fn close(&self, doc: MockDocument) {
        self.closes.borrow_mut().push(doc.name);
    }
}

/// Extractor returning the scripted line block, or a scripted failure.
#[derive(Debug, Default)]
pub struct MockExtractor {
    failing: HashSet<String>,
}

impl MockExtractor {
    /// Create an extractor that succeeds for every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an extraction failure for the named document.
    pub fn failing_for(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

impl ContentExtractor<MockDocument> for MockExtractor {
    fn extract(
        &self,
        doc: &MockDocument,
        _context: &PageContext,
        _settings: &ExportSettings,
    ) -> Result<String> {
        if self.failing.contains(&doc.name) {
            return Err(Error::Extraction {
                document: doc.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(doc.lines.clone())
    }
}
