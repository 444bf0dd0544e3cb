// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::report::{sheet_name_for, CompiledReport};
use crate::engine::spec::KindShape;
use crate::engine::value::{format_indian_currency, Value};
use crate::engine::{DocumentExtract, KindExtract};
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Per-document output directory, named after the institute.
    fn document_dir(&self, extract: &DocumentExtract) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(sheet_name_for(&extract.institute));
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Saves the compiled two-column report as full_report.csv.
    pub fn save_report(
        &self,
        extract: &DocumentExtract,
        report: &CompiledReport,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.document_dir(extract)?.join("full_report.csv");

        let mut writer = csv::Writer::from_path(&file_path)?;
        writer.write_record(["Parameter", "Value"])?;
        for row in &report.rows {
            writer.write_record([row.parameter.as_str(), row.value.as_str()])?;
        }
        writer.flush().map_err(StorageError::IoError)?;

        tracing::info!("Saved full report to {}", file_path.display());
        Ok(file_path)
    }

    /// Saves one wide CSV per extracted kind, named after the kind.
    pub fn save_kind_tables(&self, extract: &DocumentExtract) -> Result<Vec<PathBuf>, StorageError> {
        let target_dir = self.document_dir(extract)?;
        let mut paths = Vec::new();

        for kind in &extract.kinds {
            let file_path = target_dir.join(format!("{}.csv", kind.spec.name));
            write_kind_table(&file_path, extract, kind)?;
            tracing::info!("Saved {} table to {}", kind.spec.name, file_path.display());
            paths.push(file_path);
        }

        Ok(paths)
    }

    /// Saves extraction metadata in JSON format.
    pub fn save_metadata(
        &self,
        extract: &DocumentExtract,
        report: &CompiledReport,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.document_dir(extract)?.join("extract_meta.json");

        let kinds: Vec<serde_json::Value> = extract
            .kinds
            .iter()
            .map(|k| {
                serde_json::json!({
                    "kind": k.spec.name,
                    "title": k.spec.title,
                    "rows": k.rows.len(),
                })
            })
            .collect();

        let metadata = serde_json::json!({
            "institute_name": extract.institute.name,
            "institute_code": extract.institute.code,
            "kinds": kinds,
            "report_parameters": report.rows.len(),
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

/// Display name of the period column for a kind.
fn period_column_name(kind: &KindExtract) -> &'static str {
    match &kind.spec.shape {
        KindShape::PeriodSeries(ps) => ps.period_name,
        _ => "Academic Year",
    }
}

/// Column layout of a kind's wide table: fixed identity columns, then the
/// union of field names in first-appearance order, then derived names.
fn kind_columns(kind: &KindExtract) -> (bool, bool, Vec<String>) {
    let has_context = kind.rows.iter().any(|r| r.record.context.is_some());
    let has_period = kind
        .rows
        .iter()
        .any(|r| r.record.period.is_some() || r.record.synthetic);

    let mut columns: Vec<String> = Vec::new();
    for row in &kind.rows {
        for (name, _) in &row.record.values {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        for derived in &row.derived {
            if !columns.contains(&derived.name) {
                columns.push(derived.name.clone());
            }
        }
    }

    (has_context, has_period, columns)
}

/// Renders one cell, applying locale currency grouping to the fields the
/// kind marks for currency display.
fn render_cell(kind: &KindExtract, column: &str, value: &Value) -> String {
    if kind.spec.currency_display.iter().any(|f| *f == column) {
        if let Some(n) = value.as_f64() {
            return format_indian_currency(n);
        }
    }
    value.render()
}

fn write_kind_table(
    path: &Path,
    extract: &DocumentExtract,
    kind: &KindExtract,
) -> Result<(), StorageError> {
    let (has_context, has_period, columns) = kind_columns(kind);

    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = vec![
        "SNo".to_string(),
        "Institute Name".to_string(),
        "Institute Code".to_string(),
    ];
    if has_context {
        header.push("Program".to_string());
    }
    if has_period {
        header.push(period_column_name(kind).to_string());
    }
    header.extend(columns.iter().cloned());
    writer.write_record(&header)?;

    for (sno, row) in kind.rows.iter().enumerate() {
        let record = &row.record;
        let mut cells: Vec<String> = vec![
            (sno + 1).to_string(),
            extract.institute.name.clone(),
            extract.institute.code.clone(),
        ];
        if has_context {
            cells.push(record.context.clone().unwrap_or_default());
        }
        if has_period {
            // The trailing series Average row shows "Average" in the period
            // column; labeled synthetic rows (doctoral Total) keep it blank.
            let period = if record.synthetic && record.context.is_none() {
                "Average".to_string()
            } else {
                record.period.clone().unwrap_or_default()
            };
            cells.push(period);
        }
        for column in &columns {
            let cell = if let Some(value) = record.get(column) {
                render_cell(kind, column, value)
            } else if let Some(derived) = row.derived.iter().find(|d| &d.name == column) {
                if derived.suppressed {
                    String::new()
                } else {
                    render_cell(kind, column, &derived.value)
                }
            } else {
                String::new()
            };
            cells.push(cell);
        }
        writer.write_record(&cells)?;
    }

    writer.flush().map_err(StorageError::IoError)?;
    Ok(())
}
