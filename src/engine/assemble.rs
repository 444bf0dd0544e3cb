// src/engine/assemble.rs
//
// RecordAssembler: walks the rows of a classified table, resolves fields,
// normalizes values and emits semantic records. Rows failing a kind's
// acceptance predicate are skipped, which excludes irrelevant rows that
// share a table with relevant ones.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::RawTable;
use crate::engine::aggregate::{apply_derived, round2};
use crate::engine::classify::{full_text, header_row, normalized_row, resolve_period_header};
use crate::engine::context::condense_program;
use crate::engine::fields::resolve_columns;
use crate::engine::spec::{
    ColumnMatcher, ContextSource, DoctoralSpec, FieldType, PeriodSeriesSpec, RowTableSpec,
};
use crate::engine::value::{
    normalize_count, normalize_currency, normalize_period, Value, PERIOD_RE,
};

static TILL_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"till (\d{4}-\d{2})").expect("Failed to compile TILL_PERIOD_RE"));

static FIRST_INT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Failed to compile FIRST_INT_RE"));

static LEADING_PERIOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}").expect("Failed to compile LEADING_PERIOD_RE"));

/// One extracted record: the unit consumed by the aggregator. Immutable
/// once assembled.
#[derive(Debug, Clone)]
pub struct SemanticRecord {
    pub kind: &'static str,
    /// Context label (program identity), when the kind carries one.
    pub context: Option<String>,
    /// Period key (academic/financial year), when the kind is time-keyed.
    pub period: Option<String>,
    /// Field name -> normalized value, in configuration order.
    pub values: Vec<(String, Value)>,
    /// True for derived summary rows (e.g. the trailing Average row),
    /// which carry no period key.
    pub synthetic: bool,
}

impl SemanticRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// True when a row label names a degree program.
fn is_program_label(label: &str) -> bool {
    label.starts_with("UG [") || label.starts_with("PG [")
}

/// Assembles records from one row-shaped table occurrence.
///
/// `heading_context` is the resolved page-heading label for kinds that need
/// one; occurrences whose heading cannot be condensed to a program name are
/// skipped entirely.
pub fn assemble_row_table(
    kind: &'static str,
    context_source: ContextSource,
    rt: &RowTableSpec,
    table: &RawTable,
    heading_context: Option<&str>,
    out: &mut Vec<SemanticRecord>,
) {
    let header = header_row(table);
    let Some(columns) = resolve_columns(&header, rt.fields) else {
        tracing::debug!(kind, "table matched signature but a required column is missing");
        return;
    };

    let heading = match context_source {
        ContextSource::PageHeading => match heading_context.and_then(condense_program) {
            Some(c) => Some(c),
            None => {
                tracing::debug!(kind, "no program heading resolved for table, skipping");
                return;
            }
        },
        _ => None,
    };

    for row in table.rows.iter().skip(1) {
        let cells = normalized_row(row);

        let context = match context_source {
            ContextSource::LabelColumn => {
                let label = cells.first().cloned().unwrap_or_default();
                if label.is_empty() || !is_program_label(&label) {
                    continue;
                }
                Some(label)
            }
            ContextSource::PageHeading => heading.clone(),
            ContextSource::None => None,
        };

        let mut period: Option<String> = None;
        let mut values: Vec<(String, Value)> = Vec::new();
        let mut accepted = true;

        for (field, column) in rt.fields.iter().zip(&columns) {
            let raw = column
                .and_then(|i| cells.get(i))
                .map(String::as_str)
                .unwrap_or("");

            // A column located by its period header carries the period key
            // in the header itself, not in the cell.
            if let (ColumnMatcher::LatestPeriod, Some(i)) = (&field.matcher, column) {
                if let Some(h) = header.get(*i) {
                    period = Some(h.clone());
                }
            }

            match field.ty {
                FieldType::Period => match normalize_period(raw) {
                    Some(p) => {
                        if rt.period_field == Some(field.name) {
                            period = Some(p);
                        } else {
                            values.push((field.name.to_string(), Value::Text(p)));
                        }
                    }
                    None => {
                        if field.required {
                            accepted = false;
                            break;
                        }
                        values.push((field.name.to_string(), Value::Absent));
                    }
                },
                FieldType::Count | FieldType::Currency => {
                    let value = if field.ty == FieldType::Count {
                        normalize_count(raw)
                    } else {
                        normalize_currency(raw)
                    };
                    if value.is_absent() && field.required {
                        accepted = false;
                        break;
                    }
                    values.push((field.name.to_string(), value));
                }
            }
        }

        if !accepted {
            continue;
        }

        let derived = apply_derived(&values, rt.derived);
        values.extend(derived);

        out.push(SemanticRecord {
            kind,
            context,
            period,
            values,
            synthetic: false,
        });
    }
}

/// Accumulation state for a period-keyed series kind: metric name ->
/// period key -> value, merged across physically separate tables by
/// equality of the period key.
#[derive(Debug, Default)]
pub struct SeriesState {
    metrics: BTreeMap<&'static str, BTreeMap<String, i64>>,
}

impl SeriesState {
    pub fn is_empty(&self) -> bool {
        self.metrics.values().all(|m| m.is_empty())
    }
}

/// Period-token columns of a header row: (column index, period key).
fn period_columns(header: &[String]) -> Vec<(usize, String)> {
    header
        .iter()
        .enumerate()
        .filter_map(|(i, c)| PERIOD_RE.find(c).map(|m| (i, m.as_str().to_string())))
        .collect()
}

/// Folds one series table into the period-keyed accumulation state. Sources
/// are checked independently: a table carrying more than one category feeds
/// every source whose signature matches.
pub fn accumulate_series(ps: &PeriodSeriesSpec, table: &RawTable, state: &mut SeriesState) {
    for source in ps.sources {
        if !source.signature.matches(table) {
            continue;
        }
        let Some(header) = resolve_period_header(table) else {
            continue;
        };
        let year_cols = period_columns(&header);
        if year_cols.is_empty() {
            continue;
        }

        for row in &table.rows {
            let cells = normalized_row(row);
            let title = match cells.first() {
                Some(t) if !t.is_empty() => t.to_lowercase(),
                _ => continue,
            };
            for metric in source.metrics {
                if !metric
                    .row_contains
                    .iter()
                    .any(|k| title.contains(&k.to_lowercase()))
                {
                    continue;
                }
                let per_period = state.metrics.entry(metric.name).or_default();
                for (col, period) in &year_cols {
                    let Some(cell) = cells.get(*col) else { continue };
                    if let Value::Int(v) = normalize_currency(cell) {
                        *per_period.entry(period.clone()).or_insert(0) += v;
                    }
                }
            }
        }
    }
}

/// Merges the accumulated series into per-period records, in reverse
/// chronological order, plus the synthetic Average row when configured.
pub fn finish_series(
    kind: &'static str,
    ps: &PeriodSeriesSpec,
    state: &SeriesState,
) -> Vec<SemanticRecord> {
    let mut periods: BTreeSet<&String> = BTreeSet::new();
    for per_period in state.metrics.values() {
        periods.extend(per_period.keys());
    }
    if periods.is_empty() {
        return Vec::new();
    }
    let mut periods: Vec<&String> = periods.into_iter().collect();
    periods.sort();
    periods.reverse();

    let metric_names: Vec<&'static str> = ps
        .sources
        .iter()
        .flat_map(|s| s.metrics.iter().map(|m| m.name))
        .collect();

    let mut records = Vec::new();
    for period in &periods {
        let mut values: Vec<(String, Value)> = metric_names
            .iter()
            .map(|name| {
                let v = state
                    .metrics
                    .get(name)
                    .and_then(|m| m.get(*period))
                    .copied()
                    .unwrap_or(0);
                (name.to_string(), Value::Int(v))
            })
            .collect();
        values.extend(apply_derived(&values, ps.totals));
        records.push(SemanticRecord {
            kind,
            context: None,
            period: Some((*period).clone()),
            values,
            synthetic: false,
        });
    }

    if ps.average_row {
        // Mean of each metric's own present values; a period missing from
        // one category does not drag that category's average down.
        let mut values: Vec<(String, Value)> = metric_names
            .iter()
            .map(|name| {
                let value = match state.metrics.get(name) {
                    Some(m) if !m.is_empty() => {
                        let sum: i64 = m.values().sum();
                        Value::Float(round2(sum as f64 / m.len() as f64))
                    }
                    _ => Value::Float(0.0),
                };
                (name.to_string(), value)
            })
            .collect();
        values.extend(apply_derived(&values, ps.totals));
        records.push(SemanticRecord {
            kind,
            context: None,
            period: None,
            values,
            synthetic: true,
        });
    }

    records
}

/// Accumulation state for the doctoral details table. The first matching
/// occurrence wins.
#[derive(Debug, Default)]
pub struct DoctoralState {
    done: bool,
    pursuing_period: Option<String>,
    pursuing: Vec<(&'static str, i64)>,
    graduated: BTreeMap<&'static str, BTreeMap<String, i64>>,
}

impl DoctoralState {
    pub fn is_empty(&self) -> bool {
        self.pursuing.is_empty() && self.graduated.is_empty()
    }
}

fn row_text(cells: &[String]) -> String {
    cells
        .iter()
        .filter(|c| !c.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_integer(text: &str) -> Option<i64> {
    FIRST_INT_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Parses the doctoral table: pursuing counts in the section below the
/// anchor row (up to the graduated marker), graduated per-year counts in the
/// year-column section at and after the marker.
pub fn assemble_doctoral(ds: &DoctoralSpec, table: &RawTable, state: &mut DoctoralState) {
    if state.done {
        return;
    }

    let text = full_text(table);
    state.pursuing_period = TILL_PERIOD_RE
        .captures(&text)
        .map(|c| c[1].to_string());

    let rows: Vec<Vec<String>> = table.rows.iter().map(|r| normalized_row(r)).collect();
    let texts: Vec<String> = rows.iter().map(|r| row_text(r)).collect();

    // Pursuing section: anchored by the "Total Students" row that is not
    // itself part of the graduated section.
    let anchor = texts.iter().position(|t| {
        t.contains(ds.pursuing_anchor) && !t.to_lowercase().contains(ds.section_marker)
    });
    if let Some(a) = anchor {
        for t in &texts[a + 1..] {
            if t.to_lowercase().contains(ds.section_marker) {
                break;
            }
            for drow in ds.pursuing_rows {
                if t.contains(drow.row_contains) {
                    if let Some(n) = first_integer(t) {
                        state.pursuing.push((drow.label, n));
                    }
                }
            }
        }
    }

    // Graduated section: year header is the first row at/after the marker
    // with a cell starting in a period token.
    let marker = texts
        .iter()
        .position(|t| t.to_lowercase().contains(ds.section_marker));
    if let Some(m) = marker {
        let year_cols = rows[m..]
            .iter()
            .find(|cells| cells.iter().any(|c| LEADING_PERIOD_RE.is_match(c)))
            .map(|cells| period_columns(cells))
            .unwrap_or_default();
        if !year_cols.is_empty() {
            for cells in &rows[m..] {
                let title = cells.first().cloned().unwrap_or_default();
                for drow in ds.graduated_rows {
                    if title.contains(drow.row_contains) {
                        let per_year = state.graduated.entry(drow.label).or_default();
                        for (col, year) in &year_cols {
                            let v = cells
                                .get(*col)
                                .map(|c| match normalize_count(c) {
                                    Value::Int(n) => n,
                                    _ => 0,
                                })
                                .unwrap_or(0);
                            per_year.insert(year.clone(), v);
                        }
                    }
                }
            }
        }
    }

    state.done = !state.is_empty();
}

/// Emits the doctoral records: pursuing counts (period-keyed), then the
/// graduated series rows with per-year columns, a per-row Total and a
/// synthesized per-year total row. The program label is the record's
/// context, so compiled parameters stay distinct across the Full Time /
/// Part Time / Total rows.
pub fn finish_doctoral(
    kind: &'static str,
    ds: &DoctoralSpec,
    state: &DoctoralState,
) -> Vec<SemanticRecord> {
    let mut records = Vec::new();

    for (label, count) in &state.pursuing {
        if *count <= 0 {
            continue;
        }
        records.push(SemanticRecord {
            kind,
            context: Some(label.to_string()),
            period: state.pursuing_period.clone(),
            values: vec![("Total Students".to_string(), Value::Int(*count))],
            synthetic: false,
        });
    }

    let mut years: BTreeSet<&String> = BTreeSet::new();
    for per_year in state.graduated.values() {
        years.extend(per_year.keys());
    }
    let mut years: Vec<&String> = years.into_iter().collect();
    years.sort();
    years.reverse();

    if !years.is_empty() {
        let mut totals: BTreeMap<&String, i64> = BTreeMap::new();
        for drow in ds.graduated_rows {
            let per_year = state.graduated.get(drow.label);
            let mut values: Vec<(String, Value)> = Vec::new();
            let mut row_total = 0;
            for year in &years {
                let v = per_year.and_then(|m| m.get(*year)).copied().unwrap_or(0);
                row_total += v;
                *totals.entry(year).or_insert(0) += v;
                values.push(((*year).clone(), Value::Int(v)));
            }
            values.push(("Total".to_string(), Value::Int(row_total)));
            records.push(SemanticRecord {
                kind,
                context: Some(drow.label.to_string()),
                period: None,
                values,
                synthetic: false,
            });
        }

        let mut values: Vec<(String, Value)> = Vec::new();
        let mut grand_total = 0;
        for year in &years {
            let v = totals.get(year).copied().unwrap_or(0);
            grand_total += v;
            values.push(((*year).clone(), Value::Int(v)));
        }
        values.push(("Total".to_string(), Value::Int(grand_total)));
        records.push(SemanticRecord {
            kind,
            context: Some(ds.graduated_total_label.to_string()),
            period: None,
            values,
            synthetic: true,
        });
    }

    records
}
