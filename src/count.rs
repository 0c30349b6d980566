//! Property occurrence report.
//!
//! Tallies how often each scalar value appears under each property path of
//! a batch of records. Used to survey which fields the API actually returns
//! before deciding on column allow-lists.

use crate::error::Result;
use crate::flatten::cell_text;
use serde_json::{json, Map, Value};
use std::path::Path;
use tracing::{debug, info};

/// Keys whose values are too varied to tally; only their occurrence counts
pub const DEFAULT_IGNORE_KEYS: &[&str] = &[
    "@id",
    "@context",
    "createdAt",
    "modifiedAt",
    "notation",
    "foaf:name",
    "dc:title",
];

/// Tally of one property
#[derive(Debug, Clone, PartialEq)]
pub enum CountNode {
    /// Distinct scalar values with counts, first-seen order
    Values(Vec<(String, u64)>),
    /// Sub-properties of an object
    Fields(Vec<(String, CountNode)>),
}

impl CountNode {
    fn for_value(value: &Value) -> Self {
        match value {
            Value::Object(_) => CountNode::Fields(Vec::new()),
            Value::Array(items) => items
                .first()
                .map(CountNode::for_value)
                .unwrap_or(CountNode::Values(Vec::new())),
            _ => CountNode::Values(Vec::new()),
        }
    }

    fn tally(&mut self, text: String) {
        if let CountNode::Fields(fields) = self {
            if fields.is_empty() {
                *self = CountNode::Values(Vec::new());
            }
        }
        match self {
            CountNode::Values(values) => match values.iter_mut().find(|(v, _)| *v == text) {
                Some((_, count)) => *count += 1,
                None => values.push((text, 1)),
            },
            CountNode::Fields(_) => debug!(value = %text, "Scalar where an object was seen"),
        }
    }

    fn child(&mut self, key: &str, sample: &Value) -> Option<&mut CountNode> {
        if let CountNode::Values(values) = self {
            if values.is_empty() {
                *self = CountNode::Fields(Vec::new());
            }
        }
        let CountNode::Fields(fields) = self else {
            debug!(key, "Object where scalars were seen");
            return None;
        };
        Some(entry(fields, key, CountNode::for_value(sample)))
    }

    pub fn to_json(&self) -> Value {
        match self {
            CountNode::Values(values) => Value::Array(
                values
                    .iter()
                    .map(|(value, count)| json!({"value": value, "count": count}))
                    .collect(),
            ),
            CountNode::Fields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, node)| (k.clone(), node.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

/// Occurrence report over a batch of records
#[derive(Debug, Clone)]
pub struct CountReport {
    ignore: Vec<String>,
    /// Top-level scalar properties
    pub shallow: Vec<(String, CountNode)>,
    /// Top-level object and array properties
    pub deep: Vec<(String, CountNode)>,
}

impl Default for CountReport {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_KEYS)
    }
}

impl CountReport {
    pub fn new<S: AsRef<str>>(ignore: &[S]) -> Self {
        Self {
            ignore: ignore.iter().map(|s| s.as_ref().to_string()).collect(),
            shallow: Vec::new(),
            deep: Vec::new(),
        }
    }

    pub fn from_records(records: &[Value]) -> Self {
        let mut report = Self::default();
        for record in records {
            report.add(record);
        }
        report
    }

    /// Add one record to the tallies
    pub fn add(&mut self, record: &Value) {
        let Value::Object(map) = record else {
            return;
        };

        let Self {
            ignore,
            shallow,
            deep,
        } = self;

        for (key, value) in map {
            if value.is_null() {
                continue;
            }
            let ignored = ignore.iter().any(|k| k == key);
            let target = match value {
                Value::Object(_) | Value::Array(_) => &mut *deep,
                _ => &mut *shallow,
            };

            if ignored {
                entry(target, key, CountNode::Values(Vec::new())).tally(occurrence(key));
            } else {
                tally_value(entry(target, key, CountNode::for_value(value)), value, &*ignore);
            }
        }
    }

    pub fn to_json(&self) -> Value {
        let section = |entries: &[(String, CountNode)]| {
            Value::Object(
                entries
                    .iter()
                    .map(|(k, node)| (k.clone(), node.to_json()))
                    .collect::<Map<String, Value>>(),
            )
        };
        json!({
            "shallow": section(&self.shallow),
            "deep": section(&self.deep),
        })
    }

    /// Write the report as pretty JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, content)?;
        info!(path = %path.display(), shallow = self.shallow.len(), deep = self.deep.len(), "Wrote count report");
        Ok(())
    }
}

fn occurrence(key: &str) -> String {
    format!("{}: occurrence only", key)
}

/// Node for `key`, inserted as `init` on first sight
fn entry<'a>(
    entries: &'a mut Vec<(String, CountNode)>,
    key: &str,
    init: CountNode,
) -> &'a mut CountNode {
    let index = match entries.iter().position(|(k, _)| k == key) {
        Some(i) => i,
        None => {
            entries.push((key.to_string(), init));
            entries.len() - 1
        }
    };
    &mut entries[index].1
}

fn tally_value(node: &mut CountNode, value: &Value, ignore: &[String]) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                tally_value(node, item, ignore);
            }
        }
        Value::Object(map) => {
            for (key, child_value) in map {
                if child_value.is_null() {
                    continue;
                }
                let ignored = ignore.iter().any(|k| k == key);
                let Some(child) = node.child(key, child_value) else {
                    continue;
                };
                if ignored {
                    child.tally(occurrence(key));
                } else {
                    tally_value(child, child_value, &*ignore);
                }
            }
        }
        scalar => node.tally(cell_text(scalar)),
    }
}
