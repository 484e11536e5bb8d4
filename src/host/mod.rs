//! Host document session: the capability interface the pipeline consumes
//! source documents through.
//!
//! The core never touches a document object model directly. It opens and
//! closes documents through [`DocumentHost`], reads the little it needs via
//! [`SourceDocument`], and delegates the per-document content walk to a
//! [`ContentExtractor`]. Two adapters ship with the crate:
//!
//! - [`local::LocalHost`]: plain-text layout snapshot files on disk
//! - [`mock::MockHost`]: scripted in-memory documents for tests

pub mod local;
pub mod mock;

pub use local::{LocalExtractor, LocalHost};
pub use mock::{MockExtractor, MockHost};

use std::path::Path;

use crate::config::ExportSettings;
use crate::error::Result;
use crate::item::PageContext;
use crate::record::DocumentGeometry;

/// An opened source document, as far as the pipeline cares.
pub trait SourceDocument {
    /// File name of the opened document.
    fn name(&self) -> &str;

    /// Document-level geometry feeding the CSV header.
    fn geometry(&self) -> &DocumentGeometry;

    /// Number of pages in the document.
    fn page_count(&self) -> u32;
}

/// Opens and closes source documents.
///
/// Open failures must report locked/in-use files distinctly
/// ([`crate::Error::SourceLocked`]) from other failures so the coordinator
/// can attempt working-copy recovery.
pub trait DocumentHost {
    /// Concrete document type this host produces.
    type Doc: SourceDocument;

    /// Open the document at `path`.
    fn open(&self, path: &Path) -> Result<Self::Doc>;

    /// Close an opened document. Called unconditionally, success or failure.
    fn close(&self, doc: Self::Doc);
}

/// Walks one opened document and produces its raw output lines.
///
/// The pipeline treats the returned block as opaque newline-delimited text.
pub trait ContentExtractor<D: SourceDocument> {
    /// Extract the record lines for the catalog page in `context`.
    fn extract(&self, doc: &D, context: &PageContext, settings: &ExportSettings) -> Result<String>;
}

/// Pick the 1-based target page inside a source document.
///
/// An explicit page recorded by the catalog wins when it is in range.
/// Otherwise the spread side decides: 4-page sources map right-hand catalog
/// pages to page 2 and left-hand ones to page 3, 2-page sources map right to
/// 2 and left to 1. Everything else falls back to page 1.
pub fn target_page(page_count: u32, context: &PageContext) -> u32 {
    use crate::item::PageSide;

    if let Some(explicit) = context.source_page {
        if explicit >= 1 && explicit <= page_count {
            log::debug!("Target page from recorded source page: {}", explicit);
            return explicit;
        }
    }

    if page_count == 1 {
        return 1;
    }

    match (page_count, context.side) {
        (4, PageSide::Right) => 2,
        (4, PageSide::Left) => 3,
        (2, PageSide::Right) => 2,
        (2, PageSide::Left) => 1,
        _ => 1,
    }
}
