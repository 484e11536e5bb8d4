//! Output record model: one extracted record per processed source document,
//! plus the transient aggregate a run produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version literal written into the CSV header.
///
/// Must stay `"5"` (not `"5.0"`) so the output remains byte-compatible with
/// downstream consumers.
pub const CSV_VERSION: &str = "5";

/// Document-level geometry that feeds the CSV header line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentGeometry {
    /// Horizontal zero point.
    pub zero_x: f64,
    /// Vertical zero point.
    pub zero_y: f64,
    /// Page width in document units.
    pub page_width: f64,
    /// Page height in document units.
    pub page_height: f64,
}

impl DocumentGeometry {
    /// Create a geometry record.
    pub fn new(zero_x: f64, zero_y: f64, page_width: f64, page_height: f64) -> Self {
        Self {
            zero_x,
            zero_y,
            page_width,
            page_height,
        }
    }
}

/// Build the CSV header line: zero point, page size, format version.
///
/// The header format is an external contract; downstream parsers read it
/// positionally.
pub fn csv_header(geometry: &DocumentGeometry) -> String {
    format!(
        "{},{},{},{},{}",
        geometry.zero_x, geometry.zero_y, geometry.page_width, geometry.page_height, CSV_VERSION
    )
}

/// Metadata recorded alongside an extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// When the extraction ran.
    pub produced_at: DateTime<Utc>,
    /// Number of lines in the record's line block.
    pub line_count: usize,
    /// Name of the opened document (differs from the source name for
    /// working copies of locked files).
    #[serde(default)]
    pub document_name: String,
    /// Layer the export was restricted to.
    #[serde(default = "default_layer")]
    pub layer: String,
}

fn default_layer() -> String {
    "all layers".to_string()
}

/// One extracted record: header plus raw output lines for one source
/// document. Immutable once created; reused verbatim on cache hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvRecord {
    /// File name of the processed source document.
    pub source_name: String,

    /// Original reference name for converted items.
    #[serde(default)]
    pub converted_from: Option<String>,

    /// Catalog page number the reference sits on, `-1` when unknown.
    pub parent_page: i32,

    /// CSV header line derived from the source document's geometry.
    pub header: String,

    /// Raw newline-delimited output lines, one per detected object.
    pub lines: String,

    /// Extraction metadata.
    pub meta: RecordMeta,
}

/// Identity and reason for one failed item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    /// Cache key (or reference name) of the failed item.
    pub item: String,
    /// Human-readable reason.
    pub reason: String,
}

impl ItemFailure {
    /// Create a failure entry.
    pub fn new(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            reason: reason.into(),
        }
    }
}

/// Transient aggregate of one run: records in planning order plus the
/// collected per-item failures. Consumed by the output assembler and the
/// final summary, then discarded.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Extracted records, cache hits and fresh computations alike.
    pub records: Vec<CsvRecord>,
    /// Items that failed, with reasons. Never aborts the run.
    pub failures: Vec<ItemFailure>,
}

impl RunResult {
    /// Build the user-facing summary block.
    pub fn summary(&self) -> String {
        let total = self.records.len() + self.failures.len();
        let mut out = format!(
            "Processed: {}\nSucceeded: {}\nFailed: {}\n",
            total,
            self.records.len(),
            self.failures.len()
        );
        if !self.failures.is_empty() {
            out.push_str("\nThe following items ran into problems:\n");
            for failure in &self.failures {
                out.push_str(&format!("- {}\n  Reason: {}\n", failure.item, failure.reason));
            }
        }
        out
    }
}
