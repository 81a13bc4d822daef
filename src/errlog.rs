//! Error collection and persistence for a check run.
//!
//! Page runtime errors and failed checkpoints are recorded into an
//! append-only, run-scoped [`ErrorCollector`] and flushed to a pretty-printed
//! JSON array at teardown. The report generator later merges that file back
//! in, treating a missing or unreadable file as an empty list.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// One collected error: a message plus the stack trace (or equivalent detail)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Human-readable error message
    pub message: String,
    /// Stack trace or supporting detail, verbatim
    pub stack: String,
}

impl ErrorRecord {
    /// Create a record from message and stack text
    pub fn new(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// Append-only, run-scoped list of collected errors
#[derive(Debug, Default)]
pub struct ErrorCollector {
    records: Vec<ErrorRecord>,
}

impl ErrorCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, preserving detection order
    pub fn record(&mut self, message: impl Into<String>, stack: impl Into<String>) {
        self.records.push(ErrorRecord::new(message, stack));
    }

    /// Append an already-built record
    pub fn push(&mut self, record: ErrorRecord) {
        self.records.push(record);
    }

    /// All records in detection order
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Number of collected records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Persist `errors` as a pretty-printed JSON array at `path`.
///
/// The parent directory is created if missing. The file is written to a
/// temporary sibling and renamed into place so a concurrent reader never
/// observes a half-written document. Overwrites any prior file.
pub fn flush(path: &Path, errors: &[ErrorRecord]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(errors)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a persisted error list from `path`.
///
/// A missing or unparsable file degrades to an empty list; the error log is
/// optional input for the report generator, never a prerequisite.
pub fn load(path: &Path) -> Vec<ErrorRecord> {
    match fs::read_to_string(path) {
        Ok(body) => serde_json::from_str(&body).unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collector_preserves_order() {
        let mut collector = ErrorCollector::new();
        collector.record("m1", "s1");
        collector.record("m2", "s2");
        collector.record("m3", "s3");

        let messages: Vec<&str> = collector.records().iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["m1", "m2", "m3"]);
        assert_eq!(collector.len(), 3);
        assert!(!collector.is_empty());
    }

    #[test]
    fn test_flush_empty_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reports").join("errors.json");

        flush(&path, &[]).expect("flush");
        let body = fs::read_to_string(&path).expect("read");
        assert_eq!(body, "[]");
    }

    #[test]
    fn test_flush_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("errors.json");
        let errors = vec![
            ErrorRecord::new("m1", "s1"),
            ErrorRecord::new("m2", "s2"),
        ];

        flush(&path, &errors).expect("flush");
        assert_eq!(load(&path), errors);
    }

    #[test]
    fn test_flush_overwrites_previous_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("errors.json");

        flush(&path, &[ErrorRecord::new("old", "old stack")]).expect("first flush");
        flush(&path, &[ErrorRecord::new("new", "new stack")]).expect("second flush");

        let loaded = load(&path);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].message, "new");
    }

    #[test]
    fn test_flush_is_idempotent_on_existing_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("errors.json");
        flush(&path, &[]).expect("first flush creates parent");
        flush(&path, &[]).expect("second flush with parent present");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load(&dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn test_load_garbage_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("errors.json");
        fs::write(&path, "not json at all").expect("write");
        assert!(load(&path).is_empty());
    }
}
