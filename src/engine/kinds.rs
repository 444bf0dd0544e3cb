// src/engine/kinds.rs
//
// The built-in table kind catalogue. Everything the engine knows about the
// report family lives here as data; the surrounding pipeline never mentions
// a concrete kind by name.

use crate::engine::spec::{
    ColumnMatcher, ContextSource, Derived, DoctoralRow, DoctoralSpec, FieldSpec, FieldType,
    GroupAverage, KindShape, PeriodSeriesSpec, RowTableSpec, SeriesMetric, SeriesSource, Signature,
    TableKindSpec,
};

// --- Student strength ---------------------------------------------------
//
// One physical table ("Total Actual Student Strength") carrying gender,
// location and financial support columns per program row. Demographic and
// reimbursement columns vary by report year, so only the core columns are
// required.

const STUDENT_STRENGTH_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "Total Students",
        matcher: ColumnMatcher::Exact("Total Students"),
        required: true,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Female Students",
        matcher: ColumnMatcher::Exact("No. of Female Students"),
        required: true,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Outside State",
        matcher: ColumnMatcher::Exact("Outside State (Including male & female)"),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Outside Country",
        matcher: ColumnMatcher::Exact("Outside Country (Including male & female)"),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Economically Backward",
        matcher: ColumnMatcher::Exact("Economically Backward (Including male & female)"),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Socially Challenged (SC+ST+OBC)",
        matcher: ColumnMatcher::Exact("Socially Challenged (SC+ST+OBC Including male & female)"),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Reimbursed by Govt.",
        matcher: ColumnMatcher::Exact(
            "No. of students receiving full tuition fee reimbursement from the State and Central Government",
        ),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Reimbursed by Institution",
        matcher: ColumnMatcher::Exact(
            "No. of students receiving full tuition fee reimbursement from Institution Funds",
        ),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Reimbursed by Private Bodies",
        matcher: ColumnMatcher::Exact(
            "No. of students receiving full tuition fee reimbursement from the Private Bodies",
        ),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Not Reimbursed",
        matcher: ColumnMatcher::Exact(
            "No. of students who are not receiving full tuition fee reimbursement",
        ),
        required: false,
        ty: FieldType::Count,
    },
];

const STUDENT_STRENGTH_DERIVED: &[Derived] = &[
    Derived::Ratio {
        name: "Female Ratio (%)",
        num: "Female Students",
        den: "Total Students",
    },
    Derived::Ratio {
        name: "Outside State (%)",
        num: "Outside State",
        den: "Total Students",
    },
    Derived::Ratio {
        name: "Outside Country (%)",
        num: "Outside Country",
        den: "Total Students",
    },
];

// --- Sanctioned intake ----------------------------------------------------
//
// The approved intake table shares its generic "Academic Year" lead header
// with the program outcome tables; the exclusions keep the signatures
// pairwise disjoint.

const SANCTIONED_INTAKE_SIG: Signature = Signature::AllOf(&[
    Signature::HeaderAt(0, "Academic Year"),
    Signature::Not(&Signature::Header(&[
        "No. of students graduating in minimum stipulated time",
    ])),
    Signature::Not(&Signature::Header(&["Median salary"])),
]);

const SANCTIONED_INTAKE_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: "Sanctioned Intake",
    matcher: ColumnMatcher::LatestPeriod,
    required: true,
    ty: FieldType::Count,
}];

// --- Program outcomes -----------------------------------------------------
//
// The per-program admission/graduation/placement table. Its program identity
// is a heading printed above the table, not a column. Two "Academic Year"
// columns bracket the cohort: the first is the admission year, the last the
// graduation year.

const PROGRAM_OUTCOME_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "Admission Year",
        matcher: ColumnMatcher::NthExact {
            text: "Academic Year",
            nth: 0,
            min_col: 0,
        },
        required: true,
        ty: FieldType::Period,
    },
    FieldSpec {
        name: "Admitted",
        matcher: ColumnMatcher::Exact("No. of first year students admitted in the year"),
        required: true,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Lateral Entry",
        matcher: ColumnMatcher::Exact("No. of students admitted through Lateral entry"),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Graduation Year",
        matcher: ColumnMatcher::LastExact("Academic Year"),
        required: true,
        ty: FieldType::Period,
    },
    FieldSpec {
        name: "Graduated",
        matcher: ColumnMatcher::Exact("No. of students graduating in minimum stipulated time"),
        required: true,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Placed",
        matcher: ColumnMatcher::Exact("No. of students placed"),
        required: false,
        ty: FieldType::Count,
    },
    FieldSpec {
        name: "Median Salary",
        matcher: ColumnMatcher::Contains("Median salary"),
        required: false,
        ty: FieldType::Currency,
    },
    FieldSpec {
        name: "Higher Studies",
        matcher: ColumnMatcher::Exact("No. of students selected for Higher Studies"),
        required: false,
        ty: FieldType::Count,
    },
];

const PROGRAM_OUTCOME_DERIVED: &[Derived] = &[
    Derived::Sum {
        name: "Total Admitted",
        terms: &["Admitted", "Lateral Entry"],
    },
    Derived::RatioOverSum {
        name: "Graduation (%)",
        num: "Graduated",
        den: &["Admitted", "Lateral Entry"],
    },
    Derived::Ratio {
        name: "Placement (%)",
        num: "Placed",
        den: "Graduated",
    },
    Derived::Ratio {
        name: "Higher Studies (%)",
        num: "Higher Studies",
        den: "Graduated",
    },
];

// --- Doctoral students ------------------------------------------------------

const PHD_SIG: Signature = Signature::AnyOf(&[
    Signature::AnyCell(&["No. of Ph.D students graduated"]),
    Signature::AnyCell(&["pursuing doctoral program"]),
]);

const PHD_SPEC: DoctoralSpec = DoctoralSpec {
    pursuing_anchor: "Total Students",
    section_marker: "graduated",
    pursuing_rows: &[
        DoctoralRow {
            label: "Ph.D. - Full Time",
            row_contains: "Full Time",
        },
        DoctoralRow {
            label: "Ph.D. - Part Time",
            row_contains: "Part Time",
        },
    ],
    graduated_rows: &[
        DoctoralRow {
            label: "Ph.D. Graduated - Full Time",
            row_contains: "Full Time",
        },
        DoctoralRow {
            label: "Ph.D. Graduated - Part Time",
            row_contains: "Part Time",
        },
    ],
    graduated_total_label: "Ph.D. Graduated - Total",
};

// --- Expenditure ------------------------------------------------------------
//
// Capital and operational spend arrive in two physically separate tables
// keyed by the same financial years; line items are accumulated per year and
// merged by year.

const EXPENDITURE_SIG: Signature = Signature::AnyOf(&[
    Signature::FirstColumn(&["Capital Expenditure"]),
    Signature::FirstColumn(&["Operational Expenditure"]),
]);

const EXPENDITURE_SERIES: PeriodSeriesSpec = PeriodSeriesSpec {
    period_name: "Academic Year",
    sources: &[
        SeriesSource {
            signature: Signature::FirstColumn(&["Capital Expenditure"]),
            metrics: &[SeriesMetric {
                name: "Capital Expenditure",
                row_contains: &[
                    "Library",
                    "New Equipment",
                    "Engineering Workshops",
                    "creation of Capital Assets",
                ],
            }],
        },
        SeriesSource {
            signature: Signature::FirstColumn(&["Operational Expenditure"]),
            metrics: &[SeriesMetric {
                name: "Operational Expenditure",
                row_contains: &[
                    "Salaries",
                    "Maintenance of Academic Infrastructure",
                    "Seminars",
                ],
            }],
        },
    ],
    totals: &[Derived::Sum {
        name: "Total Expenditure",
        terms: &["Capital Expenditure", "Operational Expenditure"],
    }],
    average_row: true,
};

// --- Project funding ----------------------------------------------------------

const PROJECT_FUNDING_SIG: Signature = Signature::AnyOf(&[
    Signature::FirstColumn(&["Sponsored Projects"]),
    Signature::FirstColumn(&["Consultancy Projects"]),
]);

const PROJECT_FUNDING_SERIES: PeriodSeriesSpec = PeriodSeriesSpec {
    period_name: "Financial Year",
    sources: &[
        SeriesSource {
            signature: Signature::FirstColumn(&["Sponsored Projects"]),
            metrics: &[
                SeriesMetric {
                    name: "Total no. of Sponsored Projects",
                    row_contains: &["Total no. of Sponsored Projects"],
                },
                SeriesMetric {
                    name: "Total Amount Received (Sponsored)",
                    row_contains: &["Total Amount Received (Amount in Rupees)"],
                },
            ],
        },
        SeriesSource {
            signature: Signature::FirstColumn(&["Consultancy Projects"]),
            metrics: &[
                SeriesMetric {
                    name: "Total no. of Consultancy Projects",
                    row_contains: &["Total no. of Consultancy Projects"],
                },
                SeriesMetric {
                    name: "Total Amount Received (Consultancy)",
                    row_contains: &["Total Amount Received (Amount in Rupees)"],
                },
            ],
        },
    ],
    totals: &[Derived::Sum {
        name: "Total Sanctioned Amount",
        terms: &[
            "Total Amount Received (Sponsored)",
            "Total Amount Received (Consultancy)",
        ],
    }],
    average_row: false,
};

static KINDS: [TableKindSpec; 6] = [
    TableKindSpec {
        name: "student_strength",
        title: "Student Strength",
        // The Male column is not part of the signature: some reports omit
        // it, and the Female/Total pair alone identifies the table.
        signature: Signature::Header(&["No. of Female Students", "Total Students"]),
        context: ContextSource::LabelColumn,
        shape: KindShape::RowTable(RowTableSpec {
            fields: STUDENT_STRENGTH_FIELDS,
            period_field: None,
            derived: STUDENT_STRENGTH_DERIVED,
            group_average: None,
            first_only: true,
        }),
        currency_display: &[],
    },
    TableKindSpec {
        name: "sanctioned_intake",
        title: "Sanctioned Intake",
        signature: SANCTIONED_INTAKE_SIG,
        context: ContextSource::LabelColumn,
        shape: KindShape::RowTable(RowTableSpec {
            fields: SANCTIONED_INTAKE_FIELDS,
            period_field: None,
            derived: &[],
            group_average: None,
            first_only: false,
        }),
        currency_display: &[],
    },
    TableKindSpec {
        name: "program_outcomes",
        title: "Program Outcomes",
        signature: Signature::Header(&["No. of students graduating in minimum stipulated time"]),
        context: ContextSource::PageHeading,
        shape: KindShape::RowTable(RowTableSpec {
            fields: PROGRAM_OUTCOME_FIELDS,
            period_field: Some("Graduation Year"),
            derived: PROGRAM_OUTCOME_DERIVED,
            group_average: Some(GroupAverage {
                source: "Median Salary",
                name: "Average Median Salary",
            }),
            first_only: false,
        }),
        currency_display: &["Median Salary", "Average Median Salary"],
    },
    TableKindSpec {
        name: "phd_students",
        title: "Ph.D. Students",
        signature: PHD_SIG,
        context: ContextSource::None,
        shape: KindShape::Doctoral(PHD_SPEC),
        currency_display: &[],
    },
    TableKindSpec {
        name: "expenditure",
        title: "Expenditure",
        signature: EXPENDITURE_SIG,
        context: ContextSource::None,
        shape: KindShape::PeriodSeries(EXPENDITURE_SERIES),
        currency_display: &[
            "Capital Expenditure",
            "Operational Expenditure",
            "Total Expenditure",
        ],
    },
    TableKindSpec {
        name: "project_funding",
        title: "Project Funding",
        signature: PROJECT_FUNDING_SIG,
        context: ContextSource::None,
        shape: KindShape::PeriodSeries(PROJECT_FUNDING_SERIES),
        currency_display: &[
            "Total Amount Received (Sponsored)",
            "Total Amount Received (Consultancy)",
            "Total Sanctioned Amount",
        ],
    },
];

/// The built-in kind catalogue, in classification priority order.
pub fn kind_specs() -> &'static [TableKindSpec] {
    &KINDS
}

/// Selects the active kinds: all of them, or the named subset. Unknown
/// names are ignored.
pub fn select_kinds(names: Option<&[String]>) -> Vec<&'static TableKindSpec> {
    match names {
        None => KINDS.iter().collect(),
        Some(names) => KINDS
            .iter()
            .filter(|spec| names.iter().any(|n| n == spec.name))
            .collect(),
    }
}
