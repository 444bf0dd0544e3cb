// src/engine/classify.rs
//
// TableClassifier: decides whether a raw table is an occurrence of a known
// table kind, purely by its content signature. No match is never an error;
// the table is simply ignored.

use crate::document::RawTable;
use crate::engine::spec::{Signature, TableKindSpec};
use crate::engine::value::{collapse, PERIOD_RE};

/// Normalizes one optional cell: line breaks collapsed, trimmed, None -> "".
pub fn normalize_cell(cell: &Option<String>) -> String {
    cell.as_deref().map(collapse).unwrap_or_default()
}

/// Normalizes a whole row.
pub fn normalized_row(row: &[Option<String>]) -> Vec<String> {
    row.iter().map(normalize_cell).collect()
}

/// The table's structural header: normalized row 0 (empty for empty tables).
pub fn header_row(table: &RawTable) -> Vec<String> {
    table.rows.first().map(|r| normalized_row(r)).unwrap_or_default()
}

/// Resolves the header row for field mapping. Tables whose informative
/// header is not structural row 0 (e.g. a caption row on top) are scanned
/// top-down for the first row containing a period-like token; that row is
/// the header. Falls back to row 0.
pub fn resolve_period_header(table: &RawTable) -> Option<Vec<String>> {
    table
        .rows
        .iter()
        .map(|r| normalized_row(r))
        .find(|cells| cells.iter().any(|c| PERIOD_RE.is_match(c)))
}

/// Concatenated normalized first-column text.
fn first_column_text(table: &RawTable) -> String {
    table
        .rows
        .iter()
        .filter_map(|r| r.first())
        .map(normalize_cell)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Concatenated normalized text of every cell.
pub(crate) fn full_text(table: &RawTable) -> String {
    table
        .rows
        .iter()
        .flat_map(|r| r.iter())
        .map(normalize_cell)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Signature {
    /// True when this signature positively identifies the table.
    pub fn matches(&self, table: &RawTable) -> bool {
        match self {
            Signature::Header(required) => {
                let header = header_row(table);
                required
                    .iter()
                    .all(|req| header.iter().any(|cell| cell.contains(req)))
            }
            Signature::HeaderAt(idx, text) => header_row(table)
                .get(*idx)
                .map(|cell| cell.contains(text))
                .unwrap_or(false),
            Signature::FirstColumn(required) => {
                let text = first_column_text(table);
                required.iter().all(|req| text.contains(req))
            }
            Signature::AnyCell(required) => {
                let text = full_text(table);
                required.iter().all(|req| text.contains(req))
            }
            Signature::AllOf(sigs) => sigs.iter().all(|s| s.matches(table)),
            Signature::AnyOf(sigs) => sigs.iter().any(|s| s.matches(table)),
            Signature::Not(sig) => !sig.matches(table),
        }
    }
}

/// Classifies a raw table against the active spec set. Returns the matched
/// spec and its index, or None (table is ignored).
pub fn classify<'a>(
    table: &RawTable,
    specs: &[&'a TableKindSpec],
) -> Option<(usize, &'a TableKindSpec)> {
    if table.rows.len() < 2 {
        return None; // header alone carries no records
    }
    specs
        .iter()
        .enumerate()
        .find(|(_, spec)| spec.signature.matches(table))
        .map(|(i, spec)| (i, *spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<&str>>) -> RawTable {
        RawTable {
            top: 0.0,
            text_above: None,
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|c| Some(c.to_string())).collect())
                .collect(),
        }
    }

    #[test]
    fn test_header_signature_requires_all_substrings() {
        let t = table(vec![
            vec!["Program", "Total Students", "No. of Female\nStudents"],
            vec!["UG [4 Years]", "1000", "450"],
        ]);
        assert!(Signature::Header(&["Total Students", "No. of Female Students"]).matches(&t));
        assert!(!Signature::Header(&["Total Students", "Median salary"]).matches(&t));
    }

    #[test]
    fn test_header_cells_collapse_line_breaks_before_matching() {
        let t = table(vec![vec!["No. of\nFemale Students"], vec!["450"]]);
        assert!(Signature::Header(&["No. of Female Students"]).matches(&t));
    }

    #[test]
    fn test_first_column_signature() {
        let t = table(vec![
            vec!["Annual Capital Expenditure on Academic Activities", ""],
            vec!["Financial Year", "2022-23"],
            vec!["Library", "1,00,000 (One Lakh)"],
        ]);
        assert!(Signature::FirstColumn(&["Capital Expenditure"]).matches(&t));
        assert!(!Signature::FirstColumn(&["Operational Expenditure"]).matches(&t));
    }

    #[test]
    fn test_boolean_combinators() {
        let t = table(vec![
            vec!["Academic Year", "2022-23", "2021-22"],
            vec!["UG [4 Years Program(s)]", "120", "110"],
        ]);
        const SIG: Signature = Signature::AllOf(&[
            Signature::HeaderAt(0, "Academic Year"),
            Signature::Not(&Signature::Header(&["No. of students placed"])),
        ]);
        assert!(SIG.matches(&t));

        let placed = table(vec![
            vec!["Academic Year", "No. of students placed"],
            vec!["2022-23", "90"],
        ]);
        assert!(!SIG.matches(&placed));
    }

    #[test]
    fn test_resolve_period_header_skips_caption_rows() {
        let t = table(vec![
            vec!["Annual Expenditure", ""],
            vec!["Items", "2022-23"],
            vec!["Library", "500"],
        ]);
        let header = resolve_period_header(&t).expect("period header");
        assert_eq!(header, vec!["Items".to_string(), "2022-23".to_string()]);
    }

    #[test]
    fn test_classify_none_for_unknown_table() {
        let t = table(vec![vec!["Faculty Details", "Count"], vec!["Professors", "10"]]);
        assert!(classify(&t, &crate::engine::kinds::select_kinds(None)).is_none());
    }
}
