// src/engine/spec.rs
//
// Declarative description of one target table kind. The engine itself is
// spec-agnostic: every kind is an instance of Classify -> Resolve -> Map ->
// Normalize -> Assemble -> Aggregate differing only in this data.

/// Content signature positively identifying a table kind among unrelated
/// tables on the same page. Configured signatures must be pairwise disjoint
/// (no table may match two specs); this is enforced by a test over
/// representative tables, not resolved at runtime.
#[derive(Debug)]
pub enum Signature {
    /// Every substring appears in some normalized header (row 0) cell.
    Header(&'static [&'static str]),
    /// The normalized header cell at the given index contains the substring.
    HeaderAt(usize, &'static str),
    /// Every substring appears in the concatenated normalized first-column
    /// text. Used when the informative header is not structural row 0.
    FirstColumn(&'static [&'static str]),
    /// Every substring appears somewhere in the whole table's text.
    AnyCell(&'static [&'static str]),
    /// Boolean combinators for kinds that need exclusion to stay disjoint
    /// from other kinds sharing a generic header.
    AllOf(&'static [Signature]),
    AnyOf(&'static [Signature]),
    Not(&'static Signature),
}

/// Where a record's context label comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    /// The kind carries no context.
    None,
    /// The context is the row's own label column (e.g. "UG [4 Years Program(s)]").
    LabelColumn,
    /// The context is a heading printed outside the table, resolved from the
    /// page text above it (or the previous page's trailing text).
    PageHeading,
}

/// How a field's column is located in the resolved header row.
#[derive(Debug, Clone, Copy)]
pub enum ColumnMatcher {
    /// Normalized header cell equals the text exactly.
    Exact(&'static str),
    /// Normalized header cell contains the text.
    Contains(&'static str),
    /// The nth (0-based) header cell equal to the text, at or after `min_col`.
    /// Needed for kinds that reuse the same header text twice.
    NthExact {
        text: &'static str,
        nth: usize,
        min_col: usize,
    },
    /// The last header cell equal to the text.
    LastExact(&'static str),
    /// The column whose header is the most recent period token in the row.
    LatestPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Count,
    Currency,
    Period,
}

/// One semantic field of a row-shaped table kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub matcher: ColumnMatcher,
    pub required: bool,
    pub ty: FieldType,
}

/// Derived-field formulas computed per record from already-normalized fields.
#[derive(Debug, Clone, Copy)]
pub enum Derived {
    /// round(num / den * 100, 2) when den > 0, else exactly 0.0.
    /// Blank (Absent) when the numerator itself is absent.
    Ratio {
        name: &'static str,
        num: &'static str,
        den: &'static str,
    },
    /// Ratio whose denominator is the sum of several fields (absent = 0).
    RatioOverSum {
        name: &'static str,
        num: &'static str,
        den: &'static [&'static str],
    },
    /// Plain sum of fields (absent = 0).
    Sum {
        name: &'static str,
        terms: &'static [&'static str],
    },
}

/// Per-context-group average of one field, attached to the first row of
/// each group and suppressed (shown blank) on the rest.
#[derive(Debug, Clone, Copy)]
pub struct GroupAverage {
    pub source: &'static str,
    pub name: &'static str,
}

/// One record per accepted table row.
#[derive(Debug)]
pub struct RowTableSpec {
    pub fields: &'static [FieldSpec],
    /// Field whose value becomes the record's period key, if any.
    pub period_field: Option<&'static str>,
    pub derived: &'static [Derived],
    pub group_average: Option<GroupAverage>,
    /// Stop after the first matching table occurrence in the document.
    pub first_only: bool,
}

/// One metric of a period-keyed series table: rows whose (normalized,
/// lowercased) title contains any of the keywords contribute their per-period
/// values, accumulated by addition.
#[derive(Debug, Clone, Copy)]
pub struct SeriesMetric {
    pub name: &'static str,
    pub row_contains: &'static [&'static str],
}

/// One physical table feeding a period-keyed series kind.
#[derive(Debug)]
pub struct SeriesSource {
    pub signature: Signature,
    pub metrics: &'static [SeriesMetric],
}

/// Values accumulated across physically separate tables keyed by the same
/// period, then merged by equality of the period key.
#[derive(Debug)]
pub struct PeriodSeriesSpec {
    /// Display name of the period axis ("Academic Year" / "Financial Year").
    pub period_name: &'static str,
    pub sources: &'static [SeriesSource],
    /// Per-period totals over metric names (Derived::Sum only).
    pub totals: &'static [Derived],
    /// Append a synthetic trailing Average row over each metric's own values.
    pub average_row: bool,
}

/// A labeled series row of the doctoral details table.
#[derive(Debug, Clone, Copy)]
pub struct DoctoralRow {
    /// Output label, e.g. "Ph.D. Graduated - Full Time".
    pub label: &'static str,
    /// Substring identifying the physical row title.
    pub row_contains: &'static str,
}

/// The doctoral student details table: a pursuing-counts section anchored
/// below a "Total Students" row, followed by a graduated-counts section
/// keyed by academic-year columns.
#[derive(Debug)]
pub struct DoctoralSpec {
    /// Row text anchoring the pursuing section.
    pub pursuing_anchor: &'static str,
    /// Rows containing this (lowercased) marker start the graduated section.
    pub section_marker: &'static str,
    pub pursuing_rows: &'static [DoctoralRow],
    pub graduated_rows: &'static [DoctoralRow],
    /// Output label of the synthesized per-year total row.
    pub graduated_total_label: &'static str,
}

/// Physical shape of a table kind, selecting the assembler that walks it.
#[derive(Debug)]
pub enum KindShape {
    RowTable(RowTableSpec),
    PeriodSeries(PeriodSeriesSpec),
    Doctoral(DoctoralSpec),
}

/// A static, named description of one target table kind.
#[derive(Debug)]
pub struct TableKindSpec {
    pub name: &'static str,
    /// Human-readable title used for wide-table export.
    pub title: &'static str,
    pub signature: Signature,
    pub context: ContextSource,
    pub shape: KindShape,
    /// Fields rendered with locale currency grouping in wide-table display
    /// output. Stored and compiled values stay raw numeric.
    pub currency_display: &'static [&'static str],
}
