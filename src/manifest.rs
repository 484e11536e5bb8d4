//! Link manifest: the list of placed references exported from the catalog
//! document.
//!
//! Walking the catalog's object tree is bound to the host application and
//! happens outside this crate; the manifest is its JSON hand-off. References
//! whose names end in the source extension become direct items, `.pdf`
//! references become convert items, anything else is skipped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::item::{ExportItem, PageContext, PageSide, SOURCE_EXTENSION};

/// One placed reference as recorded by the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedLink {
    /// Reference name (file name as placed).
    pub name: String,

    /// Path recorded for the reference.
    pub path: PathBuf,

    /// Catalog page number the reference sits on.
    pub page: i32,

    /// Side of the spread.
    #[serde(default)]
    pub side: PageSide,

    /// Explicit target page inside the source, when recorded.
    #[serde(default)]
    pub source_page: Option<u32>,
}

/// The manifest file: all placed references of one catalog document.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Stem of the catalog document, used for output naming fallbacks.
    #[serde(default)]
    pub document: String,

    /// Placed references in catalog order.
    pub links: Vec<PlacedLink>,
}

impl Manifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| Error::Manifest(format!("{}: {}", path.display(), err)))?;
        serde_json::from_str(&content)
            .map_err(|err| Error::Manifest(format!("{}: {}", path.display(), err)))
    }

    /// Turn the placed references into export items, classifying each by its
    /// file extension. Unsupported references are skipped with a log line.
    pub fn into_items(self) -> Vec<ExportItem> {
        let source_suffix = format!(".{}", SOURCE_EXTENSION);
        let mut items = Vec::with_capacity(self.links.len());

        for link in self.links {
            let mut page = PageContext::new(link.page, link.side);
            page.source_page = link.source_page;

            let name_lower = link.name.to_lowercase();
            if name_lower.ends_with(&source_suffix) {
                items.push(ExportItem::direct(link.name, link.path, page));
            } else if name_lower.ends_with(".pdf") {
                items.push(ExportItem::convert(link.name, link.path, page));
            } else {
                log::debug!("Skipping unsupported reference: {}", link.name);
            }
        }
        items
    }
}
