//! Newline-delimited JSON and ID-list files.
//!
//! Batch steps hand data to each other through flat files: an ID list
//! (one record URI per line) and NDJSON files (one JSON-LD record per line).
//! Writers always append so an interrupted batch can be resumed.

use crate::error::{CiniiError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Read every record of an NDJSON file. Blank lines are skipped.
pub fn read_records(path: &Path) -> Result<Vec<Value>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| {
            CiniiError::Parse(format!("{}:{}: {}", path.display(), index + 1, e))
        })?;
        records.push(record);
    }

    info!(path = %path.display(), count = records.len(), "Loaded NDJSON records");
    Ok(records)
}

/// Append values as NDJSON, one compact JSON document per line
pub fn append_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!(path = %path.display(), count = records.len(), "Appended NDJSON records");
    Ok(())
}

/// Read an ID list: trimmed, blank lines skipped, first occurrence kept
pub fn read_id_list(path: &Path) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    let mut duplicates = 0usize;

    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if id.is_empty() {
            continue;
        }
        if seen.insert(id.to_string()) {
            ids.push(id.to_string());
        } else {
            duplicates += 1;
        }
    }

    info!(path = %path.display(), count = ids.len(), duplicates, "Loaded ID list");
    Ok(ids)
}

/// Append IDs to an ID list file, one per line
pub fn append_ids<S: AsRef<str>>(path: &Path, ids: &[S]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for id in ids {
        writeln!(writer, "{}", id.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

/// `@id`s already present in an NDJSON file; empty when the file is missing
pub fn existing_ids(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    Ok(read_records(path)?
        .iter()
        .filter_map(|r| r.get("@id").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_append_then_read_records() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("records.jsonl");

        append_records(&path, &[json!({"@id": "a"}), json!({"@id": "b"})])?;
        append_records(&path, &[json!({"@id": "c", "dc:title": [{"@value": "がん"}]})])?;

        let records = read_records(&path)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["dc:title"][0]["@value"], "がん");

        let content = std::fs::read_to_string(&path)?;
        assert_eq!(content.lines().count(), 3);
        assert!(content.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn test_read_records_reports_line() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.jsonl");
        std::fs::write(&path, "{\"@id\": \"a\"}\n\n{not json}\n")?;

        let err = read_records(&path).expect_err("line 3 is invalid");
        assert!(err.to_string().contains(":3:"), "{}", err);
        Ok(())
    }

    #[test]
    fn test_id_list_dedupes_in_order() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("ids.txt");

        append_ids(&path, &["https://cir.nii.ac.jp/crid/2", "https://cir.nii.ac.jp/crid/1"])?;
        append_ids(&path, &["  https://cir.nii.ac.jp/crid/2 ", "", "https://cir.nii.ac.jp/crid/3"])?;

        let ids = read_id_list(&path)?;
        assert_eq!(
            ids,
            vec![
                "https://cir.nii.ac.jp/crid/2",
                "https://cir.nii.ac.jp/crid/1",
                "https://cir.nii.ac.jp/crid/3"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_existing_ids_missing_file() -> Result<()> {
        let dir = tempdir()?;
        assert!(existing_ids(&dir.path().join("none.jsonl"))?.is_empty());

        let path = dir.path().join("done.jsonl");
        append_records(&path, &[json!({"@id": "x"}), json!({"title": "no id"})])?;
        let ids = existing_ids(&path)?;
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("x"));
        Ok(())
    }
}
