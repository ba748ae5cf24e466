//! Dataset verification.
//!
//! Re-reads a JSON-Lines dataset and checks that every line is strict JSON
//! with the record shape (`messages` = user then assistant, `metadata` with
//! `source` and `category`). Produces per-category and per-source counts for
//! `--check`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Deserialize)]
struct LineRecord {
    messages: Vec<LineMessage>,
    metadata: LineMetadata,
}

#[derive(Deserialize)]
struct LineMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct LineMetadata {
    source: String,
    category: String,
}

/// Counts gathered from a valid dataset file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DatasetStats {
    pub records: usize,
    pub by_category: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
}

/// Validate every line of `path`. The first malformed line is an error.
pub fn check_dataset(path: &Path) -> Result<DatasetStats> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("cannot open dataset '{}'", path.display()))?;
    let reader = BufReader::new(file);

    let mut stats = DatasetStats::default();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.with_context(|| format!("cannot read line {}", line_no))?;

        let record: LineRecord = serde_json::from_str(&line)
            .with_context(|| format!("line {}: not a valid record", line_no))?;
        validate_messages(&record.messages)
            .with_context(|| format!("line {}: bad messages", line_no))?;

        stats.records += 1;
        *stats.by_category.entry(record.metadata.category).or_insert(0) += 1;
        *stats.by_source.entry(record.metadata.source).or_insert(0) += 1;
    }
    Ok(stats)
}

fn validate_messages(messages: &[LineMessage]) -> Result<()> {
    match messages {
        [user, assistant] if user.role == "user" && assistant.role == "assistant" => {
            if assistant.content.is_empty() {
                bail!("assistant content is empty");
            }
            Ok(())
        }
        _ => bail!("expected exactly one user and one assistant message"),
    }
}

impl DatasetStats {
    pub fn print(&self) {
        println!("check: {} valid records", self.records);
        for (category, count) in &self.by_category {
            println!("  {:<12} {}", category, count);
        }
        println!("  {} distinct sources", self.by_source.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::record::RecordWriter;
    use tempfile::TempDir;

    fn rec(response: &str, source: &str, category: &str) -> Record {
        Record {
            prompt: "Explain this.\n\twith \"quotes\"".to_string(),
            response: response.to_string(),
            source: source.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn test_counts_written_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.jsonl");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = RecordWriter::new(file);
        writer.emit(&rec("a\u{1}b", "https://a", "C")).unwrap();
        writer.emit(&rec("c", "https://b", "C")).unwrap();
        writer.emit(&rec("d", "manual", "C_OSDEV")).unwrap();
        writer.into_inner().unwrap();

        let stats = check_dataset(&path).unwrap();
        assert_eq!(stats.records, 3);
        assert_eq!(stats.by_category.get("C"), Some(&2));
        assert_eq!(stats.by_category.get("C_OSDEV"), Some(&1));
        assert_eq!(stats.by_source.len(), 3);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.jsonl");
        std::fs::write(&path, "").unwrap();
        assert_eq!(check_dataset(&path).unwrap(), DatasetStats::default());
    }

    #[test]
    fn test_reports_bad_line_number() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.jsonl");
        let good = rec("ok", "s", "C").to_json_line().unwrap();
        std::fs::write(&path, format!("{}{{\"messages\":[]}}\n", good)).unwrap();

        let err = check_dataset(&path).unwrap_err();
        assert!(err.to_string().starts_with("line 2"));
    }

    #[test]
    fn test_rejects_swapped_roles() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("roles.jsonl");
        std::fs::write(
            &path,
            "{\"messages\":[{\"role\":\"assistant\",\"content\":\"a\"},{\"role\":\"user\",\"content\":\"b\"}],\"metadata\":{\"source\":\"s\",\"category\":\"C\"}}\n",
        )
        .unwrap();
        let err = check_dataset(&path).unwrap_err();
        assert!(err.to_string().contains("bad messages"));
    }
}
