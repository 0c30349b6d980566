//! Label-keyed layout: JSON-LD keys renamed to Japanese review labels.

use crate::flatten::{cell_text, join_key, Row};
use crate::schema::{self, KEY_LABELS};
use crate::tables::{Column, Table};
use serde_json::{Map, Value};
use tracing::debug;

/// Sheet name used for the labeled layout
pub const LABELED_SHEET: &str = "Sheet1";

/// Keep allow-listed sub-keys of `value`, renamed; others are dropped
fn relabel_object(parent: &str, value: &Value) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };

    let mut out = Map::new();
    for (sub_key, sub_value) in map {
        match schema::nested_label(parent, sub_key) {
            Some(label) => {
                out.insert(label.to_string(), sub_value.clone());
            }
            None => debug!(key = %join_key(parent, sub_key), "Dropped unlabeled sub-key"),
        }
    }
    Value::Object(out)
}

/// One spreadsheet row per record.
///
/// Arrays are spread over `{label}-{index}` columns. Objects keep only
/// labeled sub-keys when a nested label table exists. Non-scalars are
/// stored as compact JSON.
pub fn labeled_row(record: &Value) -> Row {
    let mut row = Row::new();
    let Value::Object(map) = record else {
        return row;
    };

    for (key, value) in map {
        let label = schema::label(key).unwrap_or(key.as_str());
        let nested = schema::nested_labels(key).is_some();

        match value {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    let item = if nested {
                        relabel_object(key, item)
                    } else {
                        item.clone()
                    };
                    row.insert(format!("{}-{}", label, index), item.to_string());
                }
            }
            Value::Object(_) => {
                let value = if nested {
                    relabel_object(key, value)
                } else {
                    value.clone()
                };
                row.insert(label, value.to_string());
            }
            scalar => row.insert(label, cell_text(scalar)),
        }
    }
    row
}

/// Record with labeled keys, JSON structure kept
pub fn labeled_json(record: &Value) -> Value {
    let Value::Object(map) = record else {
        return record.clone();
    };

    let mut out = Map::new();
    for (key, value) in map {
        let label = match schema::label(key) {
            Some(label) => label.to_string(),
            None => {
                debug!(key = %key, "Top-level key has no label");
                key.clone()
            }
        };

        let value = match (schema::nested_labels(key), value) {
            (Some(_), Value::Array(items)) => {
                Value::Array(items.iter().map(|item| relabel_object(key, item)).collect())
            }
            (Some(_), Value::Object(_)) => relabel_object(key, value),
            _ => value.clone(),
        };
        out.insert(label, value);
    }
    Value::Object(out)
}

/// Position of the first top-level label that prefixes `header`
fn label_rank(header: &str) -> usize {
    KEY_LABELS
        .iter()
        .position(|(_, label)| header.starts_with(label))
        .unwrap_or(usize::MAX)
}

/// Union of row keys, ordered by label table position; unmatched last
pub fn labeled_header(rows: &[Row]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !header.iter().any(|h| h == key) {
                header.push(key.to_string());
            }
        }
    }
    header.sort_by_key(|h| label_rank(h));
    header
}

/// Labeled layout as a single table
pub fn labeled_table(records: &[Value]) -> Table {
    let rows: Vec<Row> = records.iter().map(labeled_row).collect();
    let columns = labeled_header(&rows)
        .into_iter()
        .map(|h| Column::new(h.clone(), h))
        .collect();

    Table {
        name: LABELED_SHEET.to_string(),
        columns,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Value {
        json!({
            "@id": "https://cir.nii.ac.jp/crid/1",
            "dc:title": [{"@language": "ja", "@value": "がん"}],
            "creator": [
                {"@id": "https://cir.nii.ac.jp/crid/2", "foaf:name": [{"@value": "山田"}], "extra": 1}
            ],
            "publication": {"prism:volume": "3", "unknown": true},
            "reviewed": false,
            "zzz:custom": "x"
        })
    }

    #[test]
    fn test_labeled_row_spreads_and_filters() {
        let row = labeled_row(&record());
        assert_eq!(row.get("CiNiiResearchのID"), Some("https://cir.nii.ac.jp/crid/1"));
        assert_eq!(row.get("タイトル-0"), Some(r#"{"@language":"ja","@value":"がん"}"#));
        assert_eq!(
            row.get("著者-0"),
            Some(r#"{"CiNiiResearchのID":"https://cir.nii.ac.jp/crid/2","氏名":[{"@value":"山田"}]}"#)
        );
        assert_eq!(row.get("掲載誌"), Some(r#"{"巻":"3"}"#));
        assert_eq!(row.get("査読の有無"), Some("false"));
        assert_eq!(row.get("zzz:custom"), Some("x"));
    }

    #[test]
    fn test_labeled_json_keeps_structure() {
        let value = labeled_json(&record());
        assert_eq!(value["著者"][0]["氏名"][0]["@value"], "山田");
        assert!(value["著者"][0].get("extra").is_none());
        assert_eq!(value["掲載誌"]["巻"], "3");
        assert_eq!(value["zzz:custom"], "x");
    }

    #[test]
    fn test_header_ordered_by_label_table() {
        let mut a = Row::new();
        a.insert("zzz:custom", "x");
        a.insert("著者-0", "{}");
        a.insert("タイトル-0", "{}");
        let mut b = Row::new();
        b.insert("CiNiiResearchのID", "id");
        b.insert("著者-1", "{}");

        let header = labeled_header(&[a, b]);
        assert_eq!(
            header,
            vec!["CiNiiResearchのID", "タイトル-0", "著者-0", "著者-1", "zzz:custom"]
        );
    }
}
