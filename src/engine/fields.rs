// src/engine/fields.rs
//
// FieldMapper: resolves each semantic field of a classified table kind to a
// column index in the resolved header row, tolerant to header reordering,
// injected whitespace and newline joins (the header cells arrive already
// normalized). Missing a required field aborts only that table occurrence;
// optional fields resolve to absent.

use crate::engine::spec::{ColumnMatcher, FieldSpec};
use crate::engine::value::PERIOD_RE;

/// Column indices per field, in spec order. `None` marks an optional field
/// whose column is not present in this header.
pub type ColumnMap = Vec<Option<usize>>;

impl ColumnMatcher {
    /// Locates this matcher's column in the normalized header row.
    pub fn resolve(&self, header: &[String]) -> Option<usize> {
        match self {
            ColumnMatcher::Exact(text) => header.iter().position(|c| c == text),
            ColumnMatcher::Contains(text) => header.iter().position(|c| c.contains(text)),
            ColumnMatcher::NthExact { text, nth, min_col } => header
                .iter()
                .enumerate()
                .filter(|(i, c)| *i >= *min_col && c.as_str() == *text)
                .map(|(i, _)| i)
                .nth(*nth),
            ColumnMatcher::LastExact(text) => header
                .iter()
                .enumerate()
                .filter(|(_, c)| c.as_str() == *text)
                .map(|(i, _)| i)
                .last(),
            ColumnMatcher::LatestPeriod => header
                .iter()
                .enumerate()
                .filter_map(|(i, c)| PERIOD_RE.find(c).map(|m| (i, m.as_str().to_string())))
                .max_by(|(_, a), (_, b)| a.cmp(b))
                .map(|(i, _)| i),
        }
    }
}

/// Resolves every field of a kind against the header. Returns None when a
/// required field is missing, which skips the table occurrence (a
/// structural absence, not a document failure).
pub fn resolve_columns(header: &[String], fields: &[FieldSpec]) -> Option<ColumnMap> {
    let mut map = Vec::with_capacity(fields.len());
    for field in fields {
        match field.matcher.resolve(header) {
            Some(idx) => map.push(Some(idx)),
            None if field.required => {
                tracing::debug!("required field '{}' not found in header", field.name);
                return None;
            }
            None => map.push(None),
        }
    }
    Some(map)
}
