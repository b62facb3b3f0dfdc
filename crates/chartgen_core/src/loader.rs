use crate::table::{is_missing_token, Column, Table};
use anyhow::{bail, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

/// Strict UTF-8 first, then windows-1252. windows-1252 is the superset of
/// latin-1/iso-8859-1 and maps every byte, so decoding cannot fail.
fn decode_csv_bytes(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::UTF_8.decode(bytes);
    if !had_errors {
        return text.into_owned();
    }
    debug!("input is not UTF-8, decoding as windows-1252");
    let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    text.into_owned()
}

/// Read a CSV or Excel file into a [`Table`]. The first row is taken as the
/// header. Empty tables are rejected here so downstream stages can assume at
/// least one row and one column.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xls" => load_excel(path)?,
        other => bail!("Unsupported file format: .{other}"),
    };

    if table.row_count() == 0 || table.column_count() == 0 {
        bail!("The uploaded file is empty");
    }
    debug!(shape = %table.shape_string(), "loaded table");
    Ok(table)
}

fn load_csv(path: &Path) -> Result<Table> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = decode_csv_bytes(&bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.context("reading CSV record")?;
        for (i, col) in cells.iter_mut().enumerate() {
            let raw = record.get(i).unwrap_or("");
            col.push(cell_value(raw));
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::new(columns)
}

fn load_excel(path: &Path) -> Result<Table> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("opening {}", path.display()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("workbook has no sheets"))?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let name = excel_cell(c).unwrap_or_default();
                if name.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    name
                }
            })
            .collect(),
        None => bail!("The uploaded file is empty"),
    };

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (i, col) in cells.iter_mut().enumerate() {
            let value = row.get(i).and_then(excel_cell).filter(|v| !is_missing_token(v));
            col.push(value);
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Table::new(columns)
}

fn cell_value(raw: &str) -> Option<String> {
    if is_missing_token(raw) {
        None
    } else {
        Some(raw.trim().to_string())
    }
}

fn excel_cell(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.trim().to_string()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(d) => Some(d.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Error(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_basic_csv() {
        let f = write_csv("region,sales\nA,10\nB,20\n");
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.column_names(), vec!["region", "sales"]);
        assert_eq!(t.numeric_column_names(), vec!["sales"]);
        assert_eq!(t.categorical_column_names(), vec!["region"]);
    }

    #[test]
    fn empty_file_is_rejected() {
        let f = write_csv("a,b\n");
        let err = load_table(f.path()).unwrap_err();
        assert!(err.to_string().contains("empty"), "{err}");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let mut f = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        f.write_all(b"whatever").unwrap();
        let err = load_table(f.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported file format"), "{err}");
    }

    #[test]
    fn missing_tokens_become_missing_cells() {
        let f = write_csv("price\n10\nNA\n\n30\n");
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.row_count(), 3);
        let col = &t.columns()[0];
        assert_eq!(col.missing_count(), 1);
        assert!(col.is_numeric());
    }

    #[test]
    fn latin1_csv_decodes() {
        let mut f = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        // "café" in latin-1 is not valid UTF-8
        f.write_all(b"name,value\ncaf\xe9,1\n").unwrap();
        let t = load_table(f.path()).unwrap();
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.columns()[0].values[0].as_deref(), Some("café"));
    }

    #[test]
    fn non_utf8_bytes_never_fail_to_decode() {
        // 0x93/0x94 sit in the windows-1252 range that latin-1 leaves
        // undefined; every byte still maps to a character.
        let text = decode_csv_bytes(b"note\n\x93quoted\x94\n");
        assert!(text.contains('\u{201c}'), "{text:?}");
        let all_high: Vec<u8> = (0x80..=0xff).collect();
        assert!(!decode_csv_bytes(&all_high).is_empty());
    }
}
