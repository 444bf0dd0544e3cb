// src/engine/mod.rs
//
// The extraction engine. Pages are walked in document order and each table
// is classified against the active kind catalogue. Matched occurrences feed
// a per-kind accumulation state that is finished into aggregated rows after
// the walk.

pub mod aggregate;
pub mod assemble;
pub mod classify;
pub mod context;
pub mod fields;
pub mod kinds;
pub mod report;
pub mod spec;
pub mod value;

use tracing::{debug, info};

use crate::document::{DocumentModel, InstituteInfo};
use crate::engine::aggregate::{group_rows, AggregatedRow};
use crate::engine::assemble::{
    accumulate_series, assemble_doctoral, assemble_row_table, finish_doctoral, finish_series,
    DoctoralState, SemanticRecord, SeriesState,
};
use crate::engine::classify::classify;
use crate::engine::context::{resolve_context, text_above_table};
use crate::engine::spec::{ContextSource, KindShape, TableKindSpec};

pub use crate::engine::context::TOP_OF_PAGE_THRESHOLD;

/// Everything extracted for one table kind.
#[derive(Debug)]
pub struct KindExtract {
    pub spec: &'static TableKindSpec,
    pub rows: Vec<AggregatedRow>,
}

/// Everything extracted from one document.
#[derive(Debug)]
pub struct DocumentExtract {
    pub institute: InstituteInfo,
    pub kinds: Vec<KindExtract>,
}

impl DocumentExtract {
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Per-kind accumulation state, shaped like the kind itself.
enum KindState {
    Rows {
        records: Vec<SemanticRecord>,
        done: bool,
    },
    Series(SeriesState),
    Doctoral(DoctoralState),
}

impl KindState {
    fn new(spec: &TableKindSpec) -> Self {
        match &spec.shape {
            KindShape::RowTable(_) => KindState::Rows {
                records: Vec::new(),
                done: false,
            },
            KindShape::PeriodSeries(_) => KindState::Series(SeriesState::default()),
            KindShape::Doctoral(_) => KindState::Doctoral(DoctoralState::default()),
        }
    }
}

/// Runs the full extraction over a parsed document.
///
/// `top_threshold` is the vertical offset below which a table is treated as
/// continuing from the previous page for context resolution.
pub fn extract_document(
    doc: &DocumentModel,
    specs: &[&'static TableKindSpec],
    top_threshold: f64,
) -> DocumentExtract {
    let institute = doc.institute_info();
    info!(
        institute = %institute.name,
        code = %institute.code,
        pages = doc.pages.len(),
        "extracting document"
    );

    let mut states: Vec<KindState> = specs.iter().map(|s| KindState::new(s)).collect();
    let mut previous_page_text = String::new();

    for (page_no, page) in doc.pages.iter().enumerate() {
        for table in &page.tables {
            let Some((idx, spec)) = classify(table, specs) else {
                continue;
            };
            debug!(kind = spec.name, page = page_no + 1, "table classified");

            let heading = match spec.context {
                ContextSource::PageHeading => {
                    let above = match &table.text_above {
                        Some(t) => t.clone(),
                        None => text_above_table(&page.text, table.top, page.height),
                    };
                    Some(resolve_context(
                        &above,
                        table.top,
                        &previous_page_text,
                        top_threshold,
                    ))
                }
                _ => None,
            };

            match (&spec.shape, &mut states[idx]) {
                (KindShape::RowTable(rt), KindState::Rows { records, done }) => {
                    if *done {
                        continue;
                    }
                    assemble_row_table(
                        spec.name,
                        spec.context,
                        rt,
                        table,
                        heading.as_deref(),
                        records,
                    );
                    if rt.first_only {
                        *done = true;
                    }
                }
                (KindShape::PeriodSeries(ps), KindState::Series(state)) => {
                    accumulate_series(ps, table, state);
                }
                (KindShape::Doctoral(ds), KindState::Doctoral(state)) => {
                    assemble_doctoral(ds, table, state);
                }
                _ => {}
            }
        }
        previous_page_text = page.text.clone();
    }

    let mut extracts = Vec::new();
    for (spec, state) in specs.iter().copied().zip(states) {
        let rows = match (&spec.shape, state) {
            (KindShape::RowTable(rt), KindState::Rows { records, .. }) => {
                group_rows(records, rt.group_average.as_ref())
            }
            (KindShape::PeriodSeries(ps), KindState::Series(state)) => {
                group_rows(finish_series(spec.name, ps, &state), None)
            }
            (KindShape::Doctoral(ds), KindState::Doctoral(state)) => {
                group_rows(finish_doctoral(spec.name, ds, &state), None)
            }
            _ => Vec::new(),
        };
        if rows.is_empty() {
            debug!(kind = spec.name, "no data of this kind found");
            continue;
        }
        info!(kind = spec.name, rows = rows.len(), "kind extracted");
        extracts.push(KindExtract { spec, rows });
    }

    DocumentExtract {
        institute,
        kinds: extracts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PageModel, RawTable};
    use crate::engine::kinds::select_kinds;
    use crate::engine::value::Value;

    fn table(top: f64, rows: Vec<Vec<&str>>) -> RawTable {
        RawTable {
            top,
            text_above: None,
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|c| Some(c.to_string())).collect())
                .collect(),
        }
    }

    fn page(text: &str, tables: Vec<RawTable>) -> PageModel {
        PageModel {
            text: text.to_string(),
            height: 842.0,
            tables,
        }
    }

    fn first_page_text() -> String {
        "Institute Name: National Institute of Widgets [IR-E-C-1234]".to_string()
    }

    fn kind<'a>(extract: &'a DocumentExtract, name: &str) -> &'a KindExtract {
        extract
            .kinds
            .iter()
            .find(|k| k.spec.name == name)
            .unwrap_or_else(|| panic!("kind {name} missing"))
    }

    #[test]
    fn test_student_strength_end_to_end() {
        let doc = DocumentModel {
            pages: vec![page(
                &first_page_text(),
                vec![table(
                    300.0,
                    vec![
                        vec![
                            "Programs",
                            "No. of Male Students",
                            "No. of Female Students",
                            "Total Students",
                        ],
                        vec!["UG [4 Years Program(s)]", "550", "450", "1000"],
                        vec!["Total", "550", "450", "1000"],
                    ],
                )],
            )],
        };

        let extract = extract_document(&doc, &select_kinds(None), TOP_OF_PAGE_THRESHOLD);
        assert_eq!(extract.institute.name, "National Institute of Widgets");
        assert_eq!(extract.institute.code, "IR-E-C-1234");

        let rows = &kind(&extract, "student_strength").rows;
        // The "Total" summary row is not a program row.
        assert_eq!(rows.len(), 1);
        let record = &rows[0].record;
        assert_eq!(record.context.as_deref(), Some("UG [4 Years Program(s)]"));
        assert_eq!(record.get("Total Students"), Some(&Value::Int(1000)));
        assert_eq!(record.get("Female Ratio (%)"), Some(&Value::Float(45.0)));
    }

    #[test]
    fn test_student_strength_without_male_column() {
        let doc = DocumentModel {
            pages: vec![page(
                &first_page_text(),
                vec![table(
                    300.0,
                    vec![
                        vec!["Program", "Total Students", "No. of Female Students"],
                        vec!["UG [4 Years]", "1000", "450"],
                    ],
                )],
            )],
        };

        let extract = extract_document(&doc, &select_kinds(None), TOP_OF_PAGE_THRESHOLD);
        let rows = &kind(&extract, "student_strength").rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].record.get("Female Ratio (%)"),
            Some(&Value::Float(45.0))
        );
    }

    #[test]
    fn test_program_outcomes_heading_from_previous_page() {
        let outcome_rows = vec![
            vec![
                "Academic Year",
                "No. of first year students admitted in the year",
                "Academic Year",
                "No. of students graduating in minimum stipulated time",
                "No. of students placed",
                "Median salary of placed graduates (Amount in Rs.)",
                "No. of students selected for Higher Studies",
            ],
            vec![
                "2019-20",
                "120",
                "2022-23",
                "100",
                "80",
                "450000 (Four Lakh Fifty Thousand)",
                "15",
            ],
        ];

        let doc = DocumentModel {
            pages: vec![
                page(
                    &format!("{}\nUG [4 Years Program(s)]", first_page_text()),
                    vec![],
                ),
                // Heading at the bottom of page 1, table at the top of page 2.
                page("Placement details", vec![table(80.0, outcome_rows)]),
            ],
        };

        let extract = extract_document(&doc, &select_kinds(None), TOP_OF_PAGE_THRESHOLD);
        let rows = &kind(&extract, "program_outcomes").rows;
        assert_eq!(rows.len(), 1);

        let record = &rows[0].record;
        assert_eq!(record.context.as_deref(), Some("UG-4"));
        assert_eq!(record.period.as_deref(), Some("2022-23"));
        assert_eq!(record.get("Graduated"), Some(&Value::Int(100)));
        assert_eq!(record.get("Median Salary"), Some(&Value::Int(450000)));
        assert_eq!(record.get("Graduation (%)"), Some(&Value::Float(83.33)));
        assert_eq!(record.get("Placement (%)"), Some(&Value::Float(80.0)));
        // The group average rides on the first row of the UG-4 group.
        assert_eq!(rows[0].derived[0].name, "Average Median Salary");
        assert_eq!(rows[0].derived[0].value, Value::Float(450000.0));
        assert!(!rows[0].derived[0].suppressed);
    }

    #[test]
    fn test_expenditure_series_merges_tables_and_appends_average() {
        let doc = DocumentModel {
            pages: vec![page(
                &first_page_text(),
                vec![
                    table(
                        200.0,
                        vec![
                            vec!["Annual Capital Expenditure on Academic Activities", "", ""],
                            vec!["Items", "2022-23", "2021-22"],
                            vec!["Library", "1,00,000 (One Lakh)", "80,000"],
                            vec!["New Equipment", "2,00,000", "1,00,000"],
                        ],
                    ),
                    table(
                        500.0,
                        vec![
                            vec!["Annual Operational Expenditure", "", ""],
                            vec!["Items", "2022-23", "2021-22"],
                            vec!["Salaries (Teaching and Non Teaching staff)", "9,00,000", "8,00,000"],
                        ],
                    ),
                ],
            )],
        };

        let extract = extract_document(&doc, &select_kinds(None), TOP_OF_PAGE_THRESHOLD);
        let rows = &kind(&extract, "expenditure").rows;
        // Two periods, newest first, plus the synthetic average row.
        assert_eq!(rows.len(), 3);

        let latest = &rows[0].record;
        assert_eq!(latest.period.as_deref(), Some("2022-23"));
        assert_eq!(latest.get("Capital Expenditure"), Some(&Value::Int(300000)));
        assert_eq!(
            latest.get("Operational Expenditure"),
            Some(&Value::Int(900000))
        );
        assert_eq!(latest.get("Total Expenditure"), Some(&Value::Int(1200000)));

        let average = &rows[2].record;
        assert!(average.synthetic);
        assert!(average.period.is_none());
        assert_eq!(
            average.get("Capital Expenditure"),
            Some(&Value::Float(240000.0))
        );
    }

    #[test]
    fn test_doctoral_sections_and_total_row() {
        let doc = DocumentModel {
            pages: vec![page(
                &first_page_text(),
                vec![table(
                    300.0,
                    vec![
                        vec!["Ph.D (Student pursuing doctoral program till 2022-23)", ""],
                        vec!["Total Students", ""],
                        vec!["Full Time", "45"],
                        vec!["Part Time", "12"],
                        vec![
                            "No. of Ph.D students graduated (including Integrated Ph.D)",
                            "",
                            "",
                            "",
                        ],
                        vec!["", "2022-23", "2021-22", "2020-21"],
                        vec!["Full Time", "10", "8", "7"],
                        vec!["Part Time", "3", "2", "4"],
                    ],
                )],
            )],
        };

        let extract = extract_document(&doc, &select_kinds(None), TOP_OF_PAGE_THRESHOLD);
        let rows = &kind(&extract, "phd_students").rows;
        // Two pursuing records, two graduated series rows, one total row.
        assert_eq!(rows.len(), 5);

        assert_eq!(rows[0].record.context.as_deref(), Some("Ph.D. - Full Time"));
        assert_eq!(rows[0].record.period.as_deref(), Some("2022-23"));
        assert_eq!(rows[0].record.get("Total Students"), Some(&Value::Int(45)));
        assert_eq!(rows[1].record.context.as_deref(), Some("Ph.D. - Part Time"));
        assert_eq!(rows[1].record.get("Total Students"), Some(&Value::Int(12)));

        assert_eq!(
            rows[3].record.context.as_deref(),
            Some("Ph.D. Graduated - Part Time")
        );
        assert_eq!(rows[3].record.get("2022-23"), Some(&Value::Int(3)));

        let total = &rows[4].record;
        assert!(total.synthetic);
        assert_eq!(total.context.as_deref(), Some("Ph.D. Graduated - Total"));
        assert_eq!(total.get("2022-23"), Some(&Value::Int(13)));
        assert_eq!(total.get("Total"), Some(&Value::Int(34)));
    }

    #[test]
    fn test_kind_filter_limits_extraction() {
        let doc = DocumentModel {
            pages: vec![page(
                &first_page_text(),
                vec![table(
                    200.0,
                    vec![
                        vec!["Financial Year", "2022-23", "2021-22"],
                        vec!["Total no. of Sponsored Projects", "12", "9"],
                        vec!["Total Amount Received (Amount in Rupees)", "4500000", "3200000"],
                    ],
                )],
            )],
        };

        let names = vec!["student_strength".to_string()];
        let extract = extract_document(&doc, &select_kinds(Some(&names)), TOP_OF_PAGE_THRESHOLD);
        assert!(extract.is_empty());

        let extract = extract_document(&doc, &select_kinds(None), TOP_OF_PAGE_THRESHOLD);
        let rows = &kind(&extract, "project_funding").rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].record.get("Total Sanctioned Amount"),
            Some(&Value::Int(4500000))
        );
    }
}
