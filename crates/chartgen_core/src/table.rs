use serde::{Deserialize, Serialize};

/// Inferred role of a column: continuous quantity vs. text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Raw cell values; `None` is a missing cell.
    pub values: Vec<Option<String>>,
    pub kind: ColumnKind,
}

/// In-memory dataset loaded from the input file. Built once by the loader,
/// read-only afterwards. Every column has `row_count` values.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

/// Tokens the loader treats as a missing cell, compared case-insensitively.
const MISSING_TOKENS: &[&str] = &["", "na", "n/a", "null", "nan"];

pub fn is_missing_token(raw: &str) -> bool {
    let t = raw.trim();
    MISSING_TOKENS.iter().any(|m| t.eq_ignore_ascii_case(m))
}

/// Numeric coercion used both for column-kind inference and for the
/// mixed-type check: trims whitespace and accepts anything `f64` parses.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        let kind = infer_kind(&values);
        Self { name: name.into(), values, kind }
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Parsed values for numeric work; non-coercible cells come back as `None`.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|v| v.as_deref().and_then(coerce_numeric))
            .collect()
    }

    /// Present numeric values paired with their row index, in row order.
    pub fn numeric_series(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_deref().and_then(coerce_numeric).map(|x| (i, x)))
            .collect()
    }
}

fn infer_kind(values: &[Option<String>]) -> ColumnKind {
    let mut present = 0usize;
    for v in values.iter().flatten() {
        present += 1;
        if coerce_numeric(v).is_none() {
            return ColumnKind::Categorical;
        }
    }
    if present > 0 {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

impl Table {
    /// Columns must have identical lengths and unique names.
    pub fn new(columns: Vec<Column>) -> anyhow::Result<Self> {
        let row_count = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for c in &columns {
            if c.values.len() != row_count {
                anyhow::bail!(
                    "column '{}' has {} rows, expected {}",
                    c.name,
                    c.values.len(),
                    row_count
                );
            }
        }
        for (i, a) in columns.iter().enumerate() {
            if columns[..i].iter().any(|b| b.name == a.name) {
                anyhow::bail!("duplicate column name '{}'", a.name);
            }
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    pub fn categorical_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| !c.is_numeric()).collect()
    }

    pub fn numeric_column_names(&self) -> Vec<String> {
        self.numeric_columns().iter().map(|c| c.name.clone()).collect()
    }

    pub fn categorical_column_names(&self) -> Vec<String> {
        self.categorical_columns().iter().map(|c| c.name.clone()).collect()
    }

    /// Human-readable shape, e.g. "4 rows × 2 columns".
    pub fn shape_string(&self) -> String {
        format!("{} rows × {} columns", self.row_count, self.columns.len())
    }

    /// Plain-text preview of the first `n` rows, used in the remote
    /// classifier prompt.
    pub fn preview(&self, n: usize) -> String {
        let mut out = String::new();
        out.push_str(&self.column_names().join(" | "));
        out.push('\n');
        for row in 0..self.row_count.min(n) {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|c| c.values[row].clone().unwrap_or_default())
                .collect();
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, vals: &[&str]) -> Column {
        Column::new(
            name,
            vals.iter()
                .map(|v| if is_missing_token(v) { None } else { Some(v.to_string()) })
                .collect(),
        )
    }

    #[test]
    fn coercion_accepts_numbers_and_rejects_text() {
        assert_eq!(coerce_numeric("10"), Some(10.0));
        assert_eq!(coerce_numeric(" -3.5 "), Some(-3.5));
        assert_eq!(coerce_numeric("1e3"), Some(1000.0));
        assert_eq!(coerce_numeric("abc"), None);
        assert_eq!(coerce_numeric(""), None);
    }

    #[test]
    fn kind_inference() {
        assert_eq!(col("a", &["1", "2", "3"]).kind, ColumnKind::Numeric);
        assert_eq!(col("b", &["1", "x", "3"]).kind, ColumnKind::Categorical);
        assert_eq!(col("c", &["", "", ""]).kind, ColumnKind::Categorical);
        // numeric columns tolerate missing cells
        assert_eq!(col("d", &["1", "", "3"]).kind, ColumnKind::Numeric);
    }

    #[test]
    fn missing_tokens_are_case_insensitive() {
        for t in ["", "NA", "n/a", "NULL", "NaN", "  "] {
            assert!(is_missing_token(t), "{t:?} should be missing");
        }
        assert!(!is_missing_token("0"));
    }

    #[test]
    fn table_rejects_ragged_and_duplicate_columns() {
        let ragged = Table::new(vec![col("a", &["1", "2"]), col("b", &["1"])]);
        assert!(ragged.is_err());
        let dup = Table::new(vec![col("a", &["1"]), col("a", &["2"])]);
        assert!(dup.is_err());
    }

    #[test]
    fn shape_string_matches_convention() {
        let t = Table::new(vec![col("a", &["1", "2", "3"])]).unwrap();
        assert_eq!(t.shape_string(), "3 rows × 1 columns");
    }
}
