//! File writers for built tables.
//!
//! XLSX puts every table on its own worksheet of one workbook. CSV writes one
//! file per table into a directory.

use crate::error::{CiniiError, Result};
use crate::labeled::labeled_json;
use crate::ndjson;
use crate::tables::Table;
use rust_xlsxwriter::Workbook;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Longest worksheet name Excel accepts
pub const MAX_SHEET_NAME: usize = 31;

/// Longest text a single XLSX cell can hold
pub const MAX_CELL_CHARS: usize = 32_767;

const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// Output format for tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Xlsx,
    Csv,
}

impl TableFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Xlsx => "xlsx",
            TableFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = CiniiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(TableFormat::Xlsx),
            "csv" => Ok(TableFormat::Csv),
            other => Err(CiniiError::Config(format!("Unknown table format: {}", other))),
        }
    }
}

/// Make `name` a legal worksheet name
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME).collect();

    if truncated.trim().is_empty() {
        "Sheet".to_string()
    } else {
        truncated
    }
}

/// Sanitized names, made unique case-insensitively with a `(n)` suffix
pub fn unique_sheet_names<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut used: Vec<String> = Vec::new();
    let mut out = Vec::new();

    for name in names {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while used.contains(&candidate.to_lowercase()) {
            let suffix = format!("({})", n);
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            candidate = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
            n += 1;
        }
        used.push(candidate.to_lowercase());
        out.push(candidate);
    }
    out
}

fn cell_limit(table: &str, column: &str, text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    warn!(table, column, "Cell text truncated to the XLSX limit");
    text.chars().take(MAX_CELL_CHARS).collect()
}

/// Write all tables into one workbook
pub fn write_xlsx(path: &Path, tables: &[Table]) -> Result<()> {
    let mut workbook = Workbook::new();
    let names = unique_sheet_names(tables.iter().map(|t| t.name.as_str()));

    for (table, name) in tables.iter().zip(&names) {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;

        for (col, column) in table.columns.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| {
                CiniiError::Validation(format!("Too many columns for sheet '{}'", name))
            })?;
            worksheet.write_string(0, col, &column.header)?;
        }

        for (index, row) in table.rows.iter().enumerate() {
            let row_num = u32::try_from(index + 1).map_err(|_| {
                CiniiError::Validation(format!("Too many rows for sheet '{}'", name))
            })?;
            for (col, column) in table.columns.iter().enumerate() {
                let Some(text) = row.get(&column.key) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                let col = u16::try_from(col).map_err(|_| {
                    CiniiError::Validation(format!("Too many columns for sheet '{}'", name))
                })?;
                worksheet.write_string(row_num, col, cell_limit(name, &column.key, text))?;
            }
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), sheets = tables.len(), "Saved workbook");
    Ok(())
}

/// Write one CSV file per table into `dir`; headers are the column keys
pub fn write_csv_dir(dir: &Path, tables: &[Table]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let names = unique_sheet_names(tables.iter().map(|t| t.name.as_str()));
    let mut paths = Vec::with_capacity(tables.len());

    for (table, name) in tables.iter().zip(&names) {
        let path = dir.join(format!("{}.csv", name));
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_path(&path)?;

        wtr.write_record(table.columns.iter().map(|c| c.key.as_str()))?;
        for row in &table.rows {
            wtr.write_record(table.columns.iter().map(|c| row.get(&c.key).unwrap_or("")))?;
        }
        wtr.flush()?;

        info!(path = %path.display(), rows = table.rows.len(), "Saved CSV");
        paths.push(path);
    }
    Ok(paths)
}

/// Write tables in `format`.
///
/// `path` is the workbook file for XLSX and the output directory for CSV.
pub fn write_tables(format: TableFormat, path: &Path, tables: &[Table]) -> Result<()> {
    match format {
        TableFormat::Xlsx => write_xlsx(path, tables),
        TableFormat::Csv => write_csv_dir(path, tables).map(|_| ()),
    }
}

/// Write records with labeled keys as NDJSON, replacing any existing file
pub fn write_labeled_ndjson(path: &Path, records: &[Value]) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let labeled: Vec<Value> = records.iter().map(labeled_json).collect();
    ndjson::append_records(path, &labeled)?;
    info!(path = %path.display(), count = labeled.len(), "Saved labeled NDJSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::Row;
    use crate::tables::Column;
    use serde_json::json;
    use tempfile::tempdir;

    fn table(name: &str) -> Table {
        let mut row = Row::new();
        row.insert("@id", "https://cir.nii.ac.jp/crid/1");
        row.insert("dc:title-@value", "がん, 治療");
        Table {
            name: name.to_string(),
            columns: vec![
                Column::new("@id", "1. CiNii ID"),
                Column::new("dc:title-@value", "2. タイトル"),
                Column::new("description-@value", "3. 概要"),
            ],
            rows: vec![row],
        }
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_sheet_name("'quoted'"), "quoted");
        assert_eq!(sanitize_sheet_name(""), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).chars().count(), MAX_SHEET_NAME);
        assert_eq!(sanitize_sheet_name("著者-所属-機関名").chars().count(), 9);
    }

    #[test]
    fn test_unique_sheet_names() {
        let names = unique_sheet_names(["Main", "main", "a?", "a*"]);
        assert_eq!(names, vec!["Main", "main(2)", "a_", "a_(2)"]);

        let long = "y".repeat(40);
        let names = unique_sheet_names([long.as_str(), long.as_str()]);
        assert_eq!(names[1].chars().count(), MAX_SHEET_NAME);
        assert!(names[1].ends_with("(2)"));
    }

    #[test]
    fn test_table_format_parse() {
        assert_eq!("CSV".parse::<TableFormat>().ok(), Some(TableFormat::Csv));
        assert!("ods".parse::<TableFormat>().is_err());
        assert_eq!(TableFormat::default(), TableFormat::Xlsx);
    }

    #[test]
    fn test_write_csv_dir() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("csv");
        let empty = Table {
            name: "URL".to_string(),
            columns: vec![Column::new("@id", "1. CiNii ID")],
            rows: Vec::new(),
        };
        let paths = write_csv_dir(&out, &[table("Main"), empty])?;
        assert_eq!(paths.len(), 2);

        let main = std::fs::read_to_string(out.join("Main.csv"))?;
        let mut lines = main.lines();
        assert_eq!(lines.next(), Some("@id,dc:title-@value,description-@value"));
        assert_eq!(lines.next(), Some("https://cir.nii.ac.jp/crid/1,\"がん, 治療\","));

        let url = std::fs::read_to_string(out.join("URL.csv"))?;
        assert_eq!(url.trim_end(), "@id");
        Ok(())
    }

    #[test]
    fn test_write_xlsx_creates_workbook() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.xlsx");
        write_tables(TableFormat::Xlsx, &path, &[table("Main"), table("著者/氏名")])?;

        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(b"PK"));
        Ok(())
    }

    #[test]
    fn test_write_labeled_ndjson_replaces_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("labeled.ndjson");
        std::fs::write(&path, "stale\n")?;

        write_labeled_ndjson(&path, &[json!({"@id": "https://cir.nii.ac.jp/crid/1"})])?;
        let records = ndjson::read_records(&path)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["CiNiiResearchのID"], "https://cir.nii.ac.jp/crid/1");
        Ok(())
    }
}
