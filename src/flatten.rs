//! JSON-LD to flat row conversion.
//!
//! Column keys join property names with [`SEPARATOR`]
//! (`creator-foaf:name-@value`). Cells are plain text.

use crate::error::{CiniiError, Result};
use serde_json::Value;
use tracing::warn;

/// Column key separator
pub const SEPARATOR: &str = "-";

/// Column-key suffix for bare scalar array elements (`dc:rights-elm`)
pub const ELEMENT_SUFFIX: &str = "elm";

/// One output row: column key to cell text, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing an existing value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(k, _)| *k == key) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Join two key parts; an empty prefix yields `key` unchanged
pub fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, SEPARATOR, key)
    }
}

/// Cell text for a JSON value.
///
/// Strings verbatim, numbers and booleans via display, null empty,
/// arrays and objects as compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Flatten a value under `prefix` into `row`.
///
/// Objects recurse; arrays found below the top are kept as JSON text.
pub fn flatten_into(row: &mut Row, prefix: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let column = join_key(prefix, key);
                match child {
                    Value::Object(_) => flatten_into(row, &column, child),
                    other => row.insert(column, cell_text(other)),
                }
            }
        }
        other => row.insert(prefix, cell_text(other)),
    }
}

/// Flatten an object into a fresh row
pub fn flatten_object(prefix: &str, value: &Value) -> Row {
    let mut row = Row::new();
    flatten_into(&mut row, prefix, value);
    row
}

/// Every top-level property as compact JSON text
pub fn stringify_top_level(record: &Value) -> Row {
    let mut row = Row::new();
    if let Value::Object(map) = record {
        for (key, value) in map {
            row.insert(key.as_str(), value.to_string());
        }
    }
    row
}

/// What to do when rows carry columns a table does not list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriftPolicy {
    /// Abort with [`CiniiError::SchemaDrift`]
    #[default]
    Fail,
    /// Log a warning; unknown cells are dropped on output
    Warn,
}

/// Distinct row keys missing from `columns`, first-seen order
pub fn unknown_keys<'a, I>(rows: I, columns: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = &'a Row>,
{
    let mut unknown: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key) && !unknown.iter().any(|k| k == key) {
                unknown.push(key.to_string());
            }
        }
    }
    unknown
}

/// Validate rows against a table's column list
pub fn check_columns<'a, I>(table: &str, rows: I, columns: &[&str], policy: DriftPolicy) -> Result<()>
where
    I: IntoIterator<Item = &'a Row>,
{
    let unknown = unknown_keys(rows, columns);
    if unknown.is_empty() {
        return Ok(());
    }

    match policy {
        DriftPolicy::Fail => Err(CiniiError::SchemaDrift {
            table: table.to_string(),
            keys: unknown,
        }),
        DriftPolicy::Warn => {
            warn!(table, keys = ?unknown, "Unknown columns dropped");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_object() {
        let value = json!({
            "@type": "Journal",
            "prism:publicationName": [{"@language": "ja", "@value": "医学雑誌"}],
            "prism:volume": "12",
            "extra": {"type": "x", "count": 3, "flag": null}
        });

        let row = flatten_object("publication", &value);
        assert_eq!(row.get("publication-@type"), Some("Journal"));
        assert_eq!(
            row.get("publication-prism:publicationName"),
            Some(r#"[{"@language":"ja","@value":"医学雑誌"}]"#)
        );
        assert_eq!(row.get("publication-extra-type"), Some("x"));
        assert_eq!(row.get("publication-extra-count"), Some("3"));
        assert_eq!(row.get("publication-extra-flag"), Some(""));
        assert_eq!(row.len(), 6);
    }

    #[test]
    fn test_flatten_scalar_uses_prefix() {
        let row = flatten_object("dc:rights-elm", &json!("CC BY"));
        assert_eq!(row.get("dc:rights-elm"), Some("CC BY"));
    }

    #[test]
    fn test_stringify_top_level_keeps_order() {
        let record = json!({"@id": "https://cir.nii.ac.jp/crid/1", "reviewed": false, "dc:title": [{"@value": "T"}]});
        let row = stringify_top_level(&record);
        let keys: Vec<_> = row.keys().collect();
        assert_eq!(keys, vec!["@id", "reviewed", "dc:title"]);
        assert_eq!(row.get("@id"), Some(r#""https://cir.nii.ac.jp/crid/1""#));
        assert_eq!(row.get("reviewed"), Some("false"));
    }

    #[test]
    fn test_row_insert_replaces_in_place() {
        let mut row = Row::new();
        row.insert("a", "1");
        row.insert("b", "2");
        row.insert("a", "3");
        assert_eq!(row.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_check_columns_policies() {
        let mut row = Row::new();
        row.insert("@id", "x");
        row.insert("mystery", "y");
        row.insert("other", "z");
        let rows = vec![row.clone(), row];

        let err = check_columns("Main", &rows, &["@id"], DriftPolicy::Fail).expect_err("drift");
        match err {
            CiniiError::SchemaDrift { table, keys } => {
                assert_eq!(table, "Main");
                assert_eq!(keys, vec!["mystery".to_string(), "other".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert!(check_columns("Main", &rows, &["@id"], DriftPolicy::Warn).is_ok());
        assert!(check_columns("Main", &rows, &["@id", "mystery", "other"], DriftPolicy::Fail).is_ok());
    }
}
