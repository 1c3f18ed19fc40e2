//! Interaction log
//!
//! Every answered question is appended to a single JSON array on disk.
//! Writes are a full read-modify-write of the file:
//! - Missing file → start from an empty array
//! - Unparseable file → start from an empty array (prior content is lost)
//! - Entries already on disk are carried over as raw JSON, untouched
//!
//! Writers inside one process are serialized; separate processes sharing a
//! log file can still drop each other's entries.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::llm::{LlmResult, ResponseMeta};
use crate::prompt::prompt_label;

/// One logged question/response exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// ISO-8601 UTC, `Z`-suffixed
    pub timestamp: String,
    pub question: String,
    /// First line of the prompt in effect
    pub prompt_used: String,
    pub response: String,
    pub meta: ResponseMeta,
}

impl InteractionRecord {
    /// Record for `question` answered under `prompt`, stamped now.
    pub fn new(question: &str, prompt: &str, result: LlmResult) -> Self {
        Self {
            timestamp: utc_timestamp(),
            question: question.to_string(),
            prompt_used: prompt_label(prompt),
            response: result.text,
            meta: result.meta,
        }
    }
}

/// Current UTC time, e.g. `2025-01-31T12:00:00.123456Z`
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Append-only JSON array log
#[derive(Debug)]
pub struct InteractionLog {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entry`, rewriting the whole file.
    pub fn append(&self, entry: &InteractionRecord) -> Result<()> {
        let _guard = self.write_guard.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }

        let mut entries = self.load_raw()?;
        entries.push(serde_json::to_value(entry).context("Failed to encode interaction")?);

        let json = serde_json::to_string_pretty(&entries).context("Failed to encode log")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!(path = %self.path.display(), entries = entries.len(), "interaction logged");
        Ok(())
    }

    /// All records that parse as [`InteractionRecord`], oldest first.
    pub fn records(&self) -> Result<Vec<InteractionRecord>> {
        Ok(self
            .load_raw()?
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect())
    }

    fn load_raw(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        match serde_json::from_slice::<Vec<Value>>(&content) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "interaction log is not a JSON array; starting over");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use tempfile::TempDir;

    fn record(question: &str) -> InteractionRecord {
        InteractionRecord::new(
            question,
            "Tutor v1\nAnswer in Portuguese.",
            LlmResult {
                text: format!("resposta para {}", question),
                meta: ResponseMeta {
                    provider: Provider::Mock,
                    usage: None,
                },
            },
        )
    }

    #[test]
    fn test_append_creates_directory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let log = InteractionLog::new(temp_dir.path().join("logs").join("interactions.json"));

        log.append(&record("q1")).unwrap();

        assert!(log.path().exists());
        let records = log.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prompt_used, "Tutor v1");
    }

    #[test]
    fn test_sequential_appends_keep_order() {
        let temp_dir = TempDir::new().unwrap();
        let log = InteractionLog::new(temp_dir.path().join("interactions.json"));

        let written: Vec<InteractionRecord> =
            (0..5).map(|i| record(&format!("pergunta {}", i))).collect();
        for entry in &written {
            log.append(entry).unwrap();
        }

        let raw = std::fs::read_to_string(log.path()).unwrap();
        let parsed: Vec<InteractionRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, written);
    }

    #[test]
    fn test_corrupt_log_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("interactions.json");
        std::fs::write(&path, "{ not json ]").unwrap();
        let log = InteractionLog::new(&path);

        log.append(&record("depois")).unwrap();

        let records = log.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].question, "depois");
    }

    #[test]
    fn test_non_array_log_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("interactions.json");
        std::fs::write(&path, r#"{"question": "solto"}"#).unwrap();
        let log = InteractionLog::new(&path);

        log.append(&record("q")).unwrap();
        assert_eq!(log.records().unwrap().len(), 1);
    }

    #[test]
    fn test_foreign_entries_are_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("interactions.json");
        std::fs::write(&path, r#"[{"legacy": true}]"#).unwrap();
        let log = InteractionLog::new(&path);

        log.append(&record("nova")).unwrap();

        let raw: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0], serde_json::json!({"legacy": true}));
        // Only well-formed records surface through records()
        assert_eq!(log.records().unwrap().len(), 1);
    }

    #[test]
    fn test_pretty_printed_with_literal_unicode() {
        let temp_dir = TempDir::new().unwrap();
        let log = InteractionLog::new(temp_dir.path().join("interactions.json"));

        log.append(&record("O que é recursão?")).unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert!(raw.starts_with("[\n  {\n    \"timestamp\""));
        assert!(raw.contains("O que é recursão?"));
        assert!(!raw.contains("\\u00e9"));
    }

    #[test]
    fn test_missing_log_has_no_records() {
        let temp_dir = TempDir::new().unwrap();
        let log = InteractionLog::new(temp_dir.path().join("missing.json"));
        assert!(log.records().unwrap().is_empty());
    }

    #[test]
    fn test_timestamp_format() {
        let ts = utc_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
