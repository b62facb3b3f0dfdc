//! Data quality checks run before any query interpretation.
//!
//! Mixed-type columns are the only hard failure: they make the numeric vs.
//! categorical role inference the renderer relies on unreliable. Everything
//! else (single row, empty columns, heavy missing data) is advisory and is
//! reported as a warning on an otherwise valid verdict.

use crate::table::{coerce_numeric, Table};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub columns_with_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityVerdict {
    pub is_valid: bool,
    pub has_warnings: bool,
    pub message: String,
    pub suggestions: Vec<String>,
    pub issues: Vec<String>,
    pub data_summary: Option<DataSummary>,
}

impl QualityVerdict {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            has_warnings: false,
            message: message.into(),
            suggestions: vec![],
            issues: vec![],
            data_summary: None,
        }
    }
}

struct MixedColumn {
    name: String,
    non_numeric_count: usize,
    examples: Vec<String>,
}

/// A categorical column counts as mixed when some, but fewer than this share
/// of its cells, fail numeric coercion.
const MIXED_TYPE_RATIO: f64 = 0.8;

/// Missing-data share above which a column is flagged as a warning.
const HIGH_MISSING_PCT: f64 = 70.0;

pub fn validate(table: &Table) -> QualityVerdict {
    if table.row_count() == 0 {
        return QualityVerdict {
            is_valid: false,
            has_warnings: false,
            message: "Your file appears to be empty or contains no readable data.".into(),
            suggestions: vec![
                "Please check that your CSV/Excel file contains data".into(),
                "Ensure the file is not corrupted".into(),
            ],
            issues: vec!["Empty dataset".into()],
            data_summary: None,
        };
    }

    let mut issues: Vec<String> = vec![];
    let mut suggestions: Vec<String> = vec![];

    if table.row_count() < 2 {
        issues.push("Dataset has only 1 row".into());
        suggestions.push("Add more data rows for meaningful visualization".into());
    }

    let mixed = find_mixed_columns(table);
    if !mixed.is_empty() {
        let issue_details = mixed
            .iter()
            .map(|m| {
                let examples = m
                    .examples
                    .iter()
                    .take(2)
                    .map(|e| format!("'{e}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Column '{}' has {} non-numeric values (e.g., {})",
                    m.name, m.non_numeric_count, examples
                )
            })
            .collect();
        return QualityVerdict {
            is_valid: false,
            has_warnings: false,
            message: "Data quality issue detected: Some columns contain mixed data types.".into(),
            suggestions: vec![
                "Clean your data by removing or fixing non-numeric values in numeric columns"
                    .into(),
                "Use consistent data types within each column".into(),
                "Consider using text columns for categorical data and numeric columns for measurements"
                    .into(),
            ],
            issues: issue_details,
            data_summary: Some(DataSummary {
                total_rows: table.row_count(),
                total_columns: table.column_count(),
                columns_with_issues: mixed.into_iter().map(|m| m.name).collect(),
            }),
        };
    }

    let empty_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| c.missing_count() == table.row_count())
        .map(|c| c.name.clone())
        .collect();
    if !empty_columns.is_empty() {
        issues.push(format!("Columns with no data: {}", empty_columns.join(", ")));
        suggestions.push("Remove empty columns or add data to them".into());
    }

    let high_missing: Vec<String> = table
        .columns()
        .iter()
        .filter_map(|c| {
            let pct = (c.missing_count() as f64 / table.row_count() as f64) * 100.0;
            (pct > HIGH_MISSING_PCT).then(|| format!("{} ({pct:.1}% missing)", c.name))
        })
        .collect();
    if !high_missing.is_empty() {
        issues.push(format!("High missing data in: {}", high_missing.join(", ")));
        suggestions.push(
            "Consider filling missing values or removing columns with excessive missing data"
                .into(),
        );
    }

    if !issues.is_empty() {
        return QualityVerdict {
            is_valid: true,
            has_warnings: true,
            message: format!("Data quality warnings detected: {}", issues.join("; ")),
            suggestions,
            issues,
            data_summary: None,
        };
    }

    QualityVerdict::ok("Data quality looks good!")
}

/// Scan categorical columns for cells that fail numeric coercion while most
/// of the column looks numeric. Fully textual columns (≥80% non-coercible)
/// are honest categorical data and pass.
fn find_mixed_columns(table: &Table) -> Vec<MixedColumn> {
    let threshold = table.row_count() as f64 * MIXED_TYPE_RATIO;
    let mut found = vec![];
    for col in table.categorical_columns() {
        let mut non_numeric = 0usize;
        let mut examples = vec![];
        for value in col.values.iter().flatten() {
            if coerce_numeric(value).is_none() {
                non_numeric += 1;
                if examples.len() < 3 {
                    examples.push(value.clone());
                }
            }
        }
        if non_numeric > 0 && (non_numeric as f64) < threshold {
            found.push(MixedColumn {
                name: col.name.clone(),
                non_numeric_count: non_numeric,
                examples,
            });
        }
    }
    found
}
