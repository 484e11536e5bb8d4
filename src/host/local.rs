//! Local host adapter: source documents as plain-text layout snapshots.
//!
//! A snapshot file carries the document geometry on its first line, followed
//! by one object line per placed object:
//!
//! ```text
//! 0,0,210,297
//! 1,G,img_001.tif,57,28,166,105
//! 1,T,Herrenuhr 12.345.678,120,30,128,92
//! 2,W,button_primary,10,10,20,20
//! ```
//!
//! Object lines are `page,kind,payload` with kinds `G` (graphic), `T` (text
//! line), `B` (table cell text) and `W` (labeled page item).
//!
//! A sibling `<name>.lock` marker signals a document that is open in another
//! session; opening it reports [`Error::SourceLocked`] so the coordinator can
//! fall back to a working copy.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use super::{target_page, ContentExtractor, DocumentHost, SourceDocument};
use crate::config::ExportSettings;
use crate::error::{Error, Result};
use crate::item::PageContext;
use crate::record::DocumentGeometry;

lazy_static! {
    /// Article numbers as they appear in catalog text: `12.345.678` or
    /// `345.678`.
    static ref ARTICLE_NUMBER: Regex =
        Regex::new(r"(\d{2}\.)?\d{3}\.\d{3}").expect("article number pattern is valid");
}

/// One parsed object line of a snapshot.
#[derive(Debug, Clone)]
struct ObjectLine {
    page: u32,
    kind: ObjectKind,
    payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    Graphic,
    Text,
    TableCell,
    PageItem,
}

impl ObjectKind {
    fn parse(tag: &str) -> Option<Self> {
        match tag {
            "G" => Some(ObjectKind::Graphic),
            "T" => Some(ObjectKind::Text),
            "B" => Some(ObjectKind::TableCell),
            "W" => Some(ObjectKind::PageItem),
            _ => None,
        }
    }
}

/// A layout snapshot opened from disk.
#[derive(Debug)]
pub struct LocalDocument {
    name: String,
    geometry: DocumentGeometry,
    page_count: u32,
    objects: Vec<ObjectLine>,
}

impl SourceDocument for LocalDocument {
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

/// Opens layout snapshot files.
#[derive(Debug, Default)]
pub struct LocalHost;

impl LocalHost {
    /// Create a local host.
    pub fn new() -> Self {
        Self
    }

    fn lock_marker(path: &Path) -> Option<std::path::PathBuf> {
        let name = path.file_name()?.to_str()?;
        Some(path.with_file_name(format!("{}.lock", name)))
    }
}

impl DocumentHost for LocalHost {
    type Doc = LocalDocument;

    fn open(&self, path: &Path) -> Result<LocalDocument> {
        if let Some(marker) = Self::lock_marker(path) {
            if marker.exists() {
                return Err(Error::SourceLocked {
                    path: path.to_path_buf(),
                });
            }
        }

        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            // A sharing violation surfaces as a permission error.
            ErrorKind::PermissionDenied => Error::SourceLocked {
                path: path.to_path_buf(),
            },
            _ => Error::OpenFailed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        })?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        log::debug!("Opened document {}", name);
        parse_snapshot(&content, name).map_err(|reason| Error::OpenFailed {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn close(&self, doc: LocalDocument) {
        log::debug!("Closed document {}", doc.name);
        drop(doc);
    }
}

fn parse_snapshot(content: &str, name: String) -> std::result::Result<LocalDocument, String> {
    let mut lines = content.lines();
    let geometry_line = lines.next().ok_or("empty snapshot")?;

    let fields: Vec<&str> = geometry_line.split(',').collect();
    if fields.len() != 4 {
        return Err(format!("malformed geometry line: {}", geometry_line));
    }
    let mut values = [0.0f64; 4];
    for (slot, field) in values.iter_mut().zip(&fields) {
        *slot = field
            .trim()
            .parse()
            .map_err(|_| format!("malformed geometry value: {}", field))?;
    }
    let geometry = DocumentGeometry::new(values[0], values[1], values[2], values[3]);

    let mut objects = Vec::new();
    let mut page_count = 1;
    for (number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.splitn(3, ',');
        let page = parts
            .next()
            .and_then(|p| p.trim().parse::<u32>().ok())
            .ok_or_else(|| format!("malformed object line {}: {}", number + 2, line))?;
        let kind = parts
            .next()
            .and_then(ObjectKind::parse)
            .ok_or_else(|| format!("unknown object kind on line {}: {}", number + 2, line))?;
        let payload = parts.next().unwrap_or("").to_string();
        page_count = page_count.max(page);
        objects.push(ObjectLine {
            page,
            kind,
            payload,
        });
    }

    Ok(LocalDocument {
        name,
        geometry,
        page_count,
        objects,
    })
}

/// Extracts record lines from [`LocalDocument`]s.
#[derive(Debug, Default)]
pub struct LocalExtractor;

impl LocalExtractor {
    /// Create a local extractor.
    pub fn new() -> Self {
        Self
    }

    /// Format one text payload (`content,y_top,x_left,y_bottom,x_right`)
    /// into an output line, or `None` when no article number is present.
    fn text_line(catalog_page: i32, payload: &str) -> Option<String> {
        let fields: Vec<&str> = payload.split(',').collect();
        if fields.len() < 5 {
            return None;
        }
        let (content, coords) = fields.split_at(fields.len() - 4);
        let content = content.join(",");
        let article = ARTICLE_NUMBER.find(&content)?.as_str();
        Some(format!("T,{},{},{}", catalog_page, article, coords.join(",")))
    }
}

impl ContentExtractor<LocalDocument> for LocalExtractor {
    fn extract(
        &self,
        doc: &LocalDocument,
        context: &PageContext,
        settings: &ExportSettings,
    ) -> Result<String> {
        let page = target_page(doc.page_count, context);
        if page < 1 || page > doc.page_count {
            return Err(Error::InvalidTargetPage {
                page,
                document: doc.name.clone(),
            });
        }

        let want_text = settings.text_frames || settings.text_in_stories;
        let mut out = String::new();
        for object in doc.objects.iter().filter(|o| o.page == page) {
            match object.kind {
                ObjectKind::Graphic if settings.graphics => {
                    out.push_str(&format!(
                        "G,{},{}\n",
                        context.page_number, object.payload
                    ));
                },
                ObjectKind::Text if want_text => {
                    if let Some(line) = Self::text_line(context.page_number, &object.payload) {
                        out.push_str(&line);
                        out.push('\n');
                    }
                },
                ObjectKind::TableCell if settings.tables => {
                    if let Some(line) = Self::text_line(context.page_number, &object.payload) {
                        out.push_str(&line);
                        out.push('\n');
                    }
                },
                ObjectKind::PageItem if settings.page_items => {
                    out.push_str(&format!(
                        "W,{},{}\n",
                        context.page_number, object.payload
                    ));
                },
                _ => {},
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::PageSide;
    use std::io::Write;

    const SNAPSHOT: &str = "0,0,210,297\n\
        1,G,img_001.tif,57,28,166,105\n\
        1,T,Herrenuhr 12.345.678,120,30,128,92\n\
        1,T,Impressum ohne Nummer,200,30,208,92\n\
        1,B,301.401 Tischdecke,150,30,158,92\n\
        2,W,button_primary,10,10,20,20\n";

    fn write_snapshot(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_open_parses_geometry_and_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "0123.indd", SNAPSHOT);

        let host = LocalHost::new();
        let doc = host.open(&path).unwrap();
        assert_eq!(doc.name(), "0123.indd");
        assert_eq!(doc.geometry(), &DocumentGeometry::new(0.0, 0.0, 210.0, 297.0));
        assert_eq!(doc.page_count(), 2);
        host.close(doc);
    }

    #[test]
    fn test_lock_marker_reports_locked() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "0123.indd", SNAPSHOT);
        write_snapshot(dir.path(), "0123.indd.lock", "");

        let err = LocalHost::new().open(&path).unwrap_err();
        assert!(err.is_locked());
    }

    #[test]
    fn test_malformed_snapshot_is_open_failure_not_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "bad.indd", "not,a,geometry\n");

        let err = LocalHost::new().open(&path).unwrap_err();
        assert!(!err.is_locked());
        assert!(matches!(err, Error::OpenFailed { .. }));
    }

    #[test]
    fn test_extract_graphics_and_matching_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "0123.indd", SNAPSHOT);
        let doc = LocalHost::new().open(&path).unwrap();

        let context = PageContext::new(12, PageSide::Left);
        let lines = LocalExtractor::new()
            .extract(&doc, &context, &ExportSettings::default())
            .unwrap();

        assert!(lines.contains("G,12,img_001.tif,57,28,166,105"));
        // Article number is pulled out of the text content.
        assert!(lines.contains("T,12,12.345.678,120,30,128,92"));
        // Text without an article number is skipped.
        assert!(!lines.contains("Impressum"));
        // Tables are off by default.
        assert!(!lines.contains("301.401"));
    }

    #[test]
    fn test_extract_honors_category_switches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "0123.indd", SNAPSHOT);
        let doc = LocalHost::new().open(&path).unwrap();

        let context = PageContext::new(12, PageSide::Left);
        let mut settings = ExportSettings::default().with_tables(true);
        settings.graphics = false;
        let lines = LocalExtractor::new()
            .extract(&doc, &context, &settings)
            .unwrap();

        assert!(!lines.contains("G,12"));
        assert!(lines.contains("T,12,301.401,150,30,158,92"));
    }

    #[test]
    fn test_extract_uses_target_page_heuristics() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_snapshot(dir.path(), "0123.indd", SNAPSHOT);
        let doc = LocalHost::new().open(&path).unwrap();

        // Right-hand catalog page on a 2-page source selects source page 2.
        let context = PageContext::new(13, PageSide::Right);
        let settings = ExportSettings::default().with_page_items(true);
        let lines = LocalExtractor::new()
            .extract(&doc, &context, &settings)
            .unwrap();

        assert!(lines.contains("W,13,button_primary,10,10,20,20"));
        assert!(!lines.contains("img_001.tif"));
    }
}
