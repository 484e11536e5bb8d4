//! Export item model: one placed reference plus its resolved source file.
//!
//! Items are created from the catalog's placed references, carry their own
//! cache key, and travel unchanged through the planner and the batch
//! coordinator.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File extension of source documents in the required format.
pub const SOURCE_EXTENSION: &str = "indd";

/// How the placed reference maps onto a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// The reference already points at a source file in the required format.
    Direct,
    /// The reference points at a different-format file (e.g. a PDF) whose
    /// same-named counterpart in the required format must be located.
    Convert,
}

/// Which side of the catalog spread the reference sits on.
///
/// Used by target-page heuristics for multi-page source documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSide {
    /// Left-hand catalog page.
    #[default]
    Left,
    /// Right-hand catalog page.
    Right,
}

/// Context of the catalog page that contains the placed reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    /// Catalog page number as printed (drives output naming and "G"/"T"
    /// line prefixes).
    pub page_number: i32,

    /// Side of the spread the page sits on.
    pub side: PageSide,

    /// Explicit target page inside the source document, when the catalog
    /// recorded one. Takes precedence over the side heuristics.
    pub source_page: Option<u32>,
}

impl PageContext {
    /// Create a page context without an explicit source page.
    pub fn new(page_number: i32, side: PageSide) -> Self {
        Self {
            page_number,
            side,
            source_page: None,
        }
    }
}

/// One unit of export work.
#[derive(Debug, Clone)]
pub struct ExportItem {
    /// How the reference maps onto a source document.
    pub mode: ExportMode,

    /// Name of the placed reference as recorded by the catalog. This is the
    /// stable identity the cache key derives from.
    pub reference_name: String,

    /// Path the catalog recorded for the reference. May be stale; resolution
    /// goes through the file locator.
    pub recorded_path: PathBuf,

    /// Original reference name in [`ExportMode::Convert`], used to derive the
    /// counterpart file name.
    pub converted_name: Option<String>,

    /// Catalog page containing the reference.
    pub page: PageContext,

    /// Resolved source file. `None` until the planner resolves it.
    pub source_file: Option<PathBuf>,
}

impl ExportItem {
    /// Create a direct item: the reference already names a source file.
    pub fn direct(
        reference_name: impl Into<String>,
        recorded_path: impl Into<PathBuf>,
        page: PageContext,
    ) -> Self {
        Self {
            mode: ExportMode::Direct,
            reference_name: reference_name.into(),
            recorded_path: recorded_path.into(),
            converted_name: None,
            page,
            source_file: None,
        }
    }

    /// Create a convert item: the reference names a different-format file.
    pub fn convert(
        reference_name: impl Into<String>,
        recorded_path: impl Into<PathBuf>,
        page: PageContext,
    ) -> Self {
        let reference_name = reference_name.into();
        Self {
            mode: ExportMode::Convert,
            reference_name: reference_name.clone(),
            recorded_path: recorded_path.into(),
            converted_name: Some(reference_name),
            page,
            source_file: None,
        }
    }

    /// Derive the stable cache key for this item.
    ///
    /// Direct mode uses the reference name as-is. Convert mode substitutes
    /// the source extension into the base name of the converted reference.
    /// The key never depends on where the resolved file currently lives, so
    /// cache entries survive file moves.
    ///
    /// Returns `None` when the required fields are missing; such items are
    /// reported and skipped, they never fail the run.
    pub fn cache_key(&self) -> Option<String> {
        match self.mode {
            ExportMode::Direct => {
                if self.reference_name.is_empty() {
                    None
                } else {
                    Some(self.reference_name.clone())
                }
            },
            ExportMode::Convert => {
                let converted = self.converted_name.as_deref()?;
                let stem = Path::new(converted).file_stem()?.to_str()?;
                Some(format!("{}.{}", stem, SOURCE_EXTENSION))
            },
        }
    }

    /// Canonical path the source file is expected at, before any fallback
    /// search. Convert mode derives the counterpart path next to the
    /// recorded reference.
    pub fn expected_path(&self) -> Option<PathBuf> {
        match self.mode {
            ExportMode::Direct => Some(self.recorded_path.clone()),
            ExportMode::Convert => {
                let dir = self.recorded_path.parent()?;
                Some(dir.join(self.cache_key()?))
            },
        }
    }
}
