// src/engine/report.rs
//
// ReportCompiler: flattens every extracted kind into one two-column
// parameter/value report per document. Parameter names are qualified by
// context and period so they stay unique across kinds; exact duplicates
// keep their first occurrence.

use std::collections::BTreeSet;

use crate::document::InstituteInfo;
use crate::engine::{DocumentExtract, KindExtract};

/// One row of the compiled report.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub parameter: String,
    pub value: String,
}

/// The full two-column report for one document.
#[derive(Debug)]
pub struct CompiledReport {
    /// Sheet-safe document title: the institute name and code, sanitized.
    pub sheet_name: String,
    pub rows: Vec<ParameterRow>,
}

/// Strips characters unsafe for sheet names and truncates to 31 characters.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .take(31)
        .collect()
}

/// Qualifies a field name with the record's context and period, e.g.
/// "Placed (UG-4) (2022-23)". Synthetic rows without a context of their own
/// (the trailing series Average row) qualify as "(Average)"; synthetic rows
/// that carry a label as context (the doctoral Total row) keep that label.
fn parameter_name(field: &str, context: Option<&str>, period: Option<&str>, synthetic: bool) -> String {
    let mut name = field.to_string();
    if let Some(context) = context {
        name.push_str(&format!(" ({context})"));
    } else if synthetic {
        name.push_str(" (Average)");
    }
    if let Some(period) = period {
        name.push_str(&format!(" ({period})"));
    }
    name
}

fn push_row(rows: &mut Vec<ParameterRow>, seen: &mut BTreeSet<String>, parameter: String, value: String) {
    // First occurrence wins.
    if seen.insert(parameter.clone()) {
        rows.push(ParameterRow { parameter, value });
    }
}

fn compile_kind(kind: &KindExtract, rows: &mut Vec<ParameterRow>, seen: &mut BTreeSet<String>) {
    for row in &kind.rows {
        let record = &row.record;
        let context = record.context.as_deref();
        let period = record.period.as_deref();

        for (field, value) in &record.values {
            let parameter = parameter_name(field, context, period, record.synthetic);
            push_row(rows, seen, parameter, value.render());
        }
        for derived in &row.derived {
            let parameter = parameter_name(&derived.name, context, period, record.synthetic);
            let value = if derived.suppressed {
                String::new()
            } else {
                derived.value.render()
            };
            push_row(rows, seen, parameter, value);
        }
    }
}

/// Compiles a document's extract into its two-column report.
pub fn compile_report(extract: &DocumentExtract) -> CompiledReport {
    let mut rows = Vec::new();
    let mut seen = BTreeSet::new();
    for kind in &extract.kinds {
        compile_kind(kind, &mut rows, &mut seen);
    }
    CompiledReport {
        sheet_name: sheet_name_for(&extract.institute),
        rows,
    }
}

/// Institute name and code joined with " | ", sanitized for use as a sheet
/// or directory name.
pub fn sheet_name_for(institute: &InstituteInfo) -> String {
    sanitize_sheet_name(&format!("{} | {}", institute.name, institute.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::aggregate::{AggregatedRow, DerivedValue};
    use crate::engine::assemble::SemanticRecord;
    use crate::engine::kinds::select_kinds;
    use crate::engine::value::Value;

    fn outcome_extract() -> DocumentExtract {
        let spec = select_kinds(Some(&["program_outcomes".to_string()]))[0];
        let record = |period: &str, placed: i64, suppressed: bool| AggregatedRow {
            record: SemanticRecord {
                kind: "program_outcomes",
                context: Some("UG-4".to_string()),
                period: Some(period.to_string()),
                values: vec![("Placed".to_string(), Value::Int(placed))],
                synthetic: false,
            },
            derived: vec![DerivedValue {
                name: "Average Median Salary".to_string(),
                value: Value::Float(350000.0),
                suppressed,
            }],
        };
        DocumentExtract {
            institute: InstituteInfo {
                name: "Some Institute".to_string(),
                code: "IR-E-C-1234".to_string(),
            },
            kinds: vec![KindExtract {
                spec,
                rows: vec![record("2022-23", 80, false), record("2021-22", 75, true)],
            }],
        }
    }

    #[test]
    fn test_parameter_names_carry_context_and_period() {
        let report = compile_report(&outcome_extract());
        // Sanitization strips the '|' separator.
        assert_eq!(report.sheet_name, "Some Institute  IR-E-C-1234");
        assert_eq!(
            report.rows[0],
            ParameterRow {
                parameter: "Placed (UG-4) (2022-23)".to_string(),
                value: "80".to_string(),
            }
        );
        // Suppressed derived values render blank but keep their slot.
        assert_eq!(report.rows[3].parameter, "Average Median Salary (UG-4) (2021-22)");
        assert_eq!(report.rows[3].value, "");
        assert_eq!(report.rows[1].value, "350000.00");
    }

    #[test]
    fn test_synthetic_rows_qualify_as_average() {
        let name = parameter_name("Capital Expenditure", None, None, true);
        assert_eq!(name, "Capital Expenditure (Average)");
    }

    #[test]
    fn test_doctoral_rows_compile_to_distinct_parameters() {
        let spec = select_kinds(Some(&["phd_students".to_string()]))[0];
        let row = |context: &str, period: Option<&str>, values: Vec<(&str, i64)>, synthetic| {
            AggregatedRow {
                record: SemanticRecord {
                    kind: "phd_students",
                    context: Some(context.to_string()),
                    period: period.map(str::to_string),
                    values: values
                        .into_iter()
                        .map(|(n, v)| (n.to_string(), Value::Int(v)))
                        .collect(),
                    synthetic,
                },
                derived: Vec::new(),
            }
        };
        let extract = DocumentExtract {
            institute: InstituteInfo {
                name: "Some Institute".to_string(),
                code: "IR-E-C-1234".to_string(),
            },
            kinds: vec![KindExtract {
                spec,
                rows: vec![
                    row("Ph.D. - Full Time", Some("2022-23"), vec![("Total Students", 45)], false),
                    row("Ph.D. - Part Time", Some("2022-23"), vec![("Total Students", 12)], false),
                    row("Ph.D. Graduated - Full Time", None, vec![("2022-23", 10), ("Total", 25)], false),
                    row("Ph.D. Graduated - Part Time", None, vec![("2022-23", 3), ("Total", 9)], false),
                    row("Ph.D. Graduated - Total", None, vec![("2022-23", 13), ("Total", 34)], true),
                ],
            }],
        };

        let report = compile_report(&extract);
        // Every row survives dedup: the program label keeps parameters unique.
        assert_eq!(report.rows.len(), 8);
        let get = |p: &str| {
            report
                .rows
                .iter()
                .find(|r| r.parameter == p)
                .unwrap_or_else(|| panic!("missing parameter {p}"))
                .value
                .clone()
        };
        assert_eq!(get("Total Students (Ph.D. - Full Time) (2022-23)"), "45");
        assert_eq!(get("Total Students (Ph.D. - Part Time) (2022-23)"), "12");
        assert_eq!(get("2022-23 (Ph.D. Graduated - Part Time)"), "3");
        assert_eq!(get("Total (Ph.D. Graduated - Total)"), "34");
        // The labeled Total row is not an Average.
        assert!(report.rows.iter().all(|r| !r.parameter.contains("(Average)")));
    }

    #[test]
    fn test_duplicate_parameters_keep_first_value() {
        let mut rows = Vec::new();
        let mut seen = BTreeSet::new();
        push_row(&mut rows, &mut seen, "P".to_string(), "1".to_string());
        push_row(&mut rows, &mut seen, "P".to_string(), "2".to_string());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "1");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("A/B:C?D"), "ABCD");
        let long = "x".repeat(40);
        assert_eq!(sanitize_sheet_name(&long).len(), 31);
    }
}
