//! Output assembler: header plus concatenated record blocks, with exact
//! duplicate lines removed.
//!
//! A pure string-level pass; no validation of line content happens here.

use indexmap::IndexSet;

use crate::record::CsvRecord;

/// Assemble the final output from the run's records.
///
/// The header line of the first record leads; later records' headers are
/// discarded, not merged, for byte compatibility with the established output
/// format. Line blocks follow in the supplied record order. Exact duplicate
/// lines are removed keeping the first occurrence, and blank lines are
/// dropped entirely.
pub fn assemble(records: &[CsvRecord]) -> String {
    let Some(first) = records.first() else {
        return String::new();
    };

    let mut content = String::new();
    content.push_str(&first.header);
    content.push('\n');
    for record in records {
        content.push_str(&record.lines);
        if !record.lines.ends_with('\n') && !record.lines.is_empty() {
            content.push('\n');
        }
    }

    let mut deduped = remove_duplicate_lines(&content);
    deduped.push('\n');
    deduped
}

/// Keep the first occurrence of every line, drop blank lines.
fn remove_duplicate_lines(content: &str) -> String {
    let mut seen: IndexSet<&str> = IndexSet::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        seen.insert(line);
    }
    seen.into_iter().collect::<Vec<_>>().join("\n")
}

/// Derive the output file name from the catalog pages that produced records.
///
/// Pages are sorted numerically; the name spans the first to the last page.
/// Without any pages the document stem is used with a marker suffix.
pub fn output_file_name(customer: &str, document_stem: &str, pages: &[i32]) -> String {
    let mut pages: Vec<i32> = pages.iter().copied().filter(|p| *p > 0).collect();
    pages.sort_unstable();
    pages.dedup();

    match (pages.first(), pages.last()) {
        (Some(first), Some(last)) => format!("{}_{}-{}.csv", customer, first, last),
        _ => {
            log::warn!("No pages recorded, falling back to the document name");
            format!("{}_{}_no_pages_found.csv", customer, document_stem)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordMeta;
    use chrono::Utc;

    fn record(header: &str, lines: &str, page: i32) -> CsvRecord {
        CsvRecord {
            source_name: "0123.indd".to_string(),
            converted_from: None,
            parent_page: page,
            header: header.to_string(),
            lines: lines.to_string(),
            meta: RecordMeta {
                produced_at: Utc::now(),
                line_count: lines.lines().count(),
                document_name: "0123.indd".to_string(),
                layer: "all layers".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_first_header_leads_later_headers_discarded() {
        let records = vec![
            record("0,0,210,297,5", "G,12,a\n", 12),
            record("0,0,420,297,5", "G,13,b\n", 13),
        ];
        let output = assemble(&records);
        assert!(output.starts_with("0,0,210,297,5\n"));
        assert!(!output.contains("0,0,420,297,5"));
    }

    #[test]
    fn test_duplicate_lines_keep_first_occurrence() {
        let records = vec![
            record("0,0,210,297,5", "G,12,a\nT,12,301.401,1,2,3,4\n", 12),
            record("0,0,210,297,5", "T,12,301.401,1,2,3,4\nG,13,b\n", 13),
        ];
        let output = assemble(&records);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "0,0,210,297,5",
                "G,12,a",
                "T,12,301.401,1,2,3,4",
                "G,13,b",
            ]
        );
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let records = vec![record("0,0,210,297,5", "G,12,a\n\n\nG,13,b\n", 12)];
        let output = assemble(&records);
        assert!(!output.contains("\n\n"));
        assert!(output.contains("G,12,a\nG,13,b"));
    }

    #[test]
    fn test_output_ends_with_single_newline() {
        let records = vec![record("0,0,210,297,5", "G,12,a\n", 12)];
        let output = assemble(&records);
        assert!(output.ends_with("G,12,a\n"));
        assert!(!output.ends_with("\n\n"));
    }

    #[test]
    fn test_record_order_is_preserved_not_sorted() {
        let records = vec![
            record("0,0,210,297,5", "G,20,z\n", 20),
            record("0,0,210,297,5", "G,3,a\n", 3),
        ];
        let output = assemble(&records);
        let z = output.find("G,20,z").unwrap();
        let a = output.find("G,3,a").unwrap();
        assert!(z < a);
    }

    #[test]
    fn test_output_file_name_spans_pages() {
        assert_eq!(
            output_file_name("personalshop", "katalog", &[13, 12, 13, 14]),
            "personalshop_12-14.csv"
        );
    }

    #[test]
    fn test_output_file_name_without_pages() {
        assert_eq!(
            output_file_name("personalshop", "katalog", &[]),
            "personalshop_katalog_no_pages_found.csv"
        );
        // Unknown pages are marked as -1 and do not count.
        assert_eq!(
            output_file_name("personalshop", "katalog", &[-1]),
            "personalshop_katalog_no_pages_found.csv"
        );
    }
}
