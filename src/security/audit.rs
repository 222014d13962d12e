//! Append-only activity audit log.
//!
//! Stored at `<state_dir>/activity.jsonl`. Every gate decision and every
//! terminal action outcome is appended as one JSON object per line. The
//! running system never rewrites or truncates the file.
//!
//! # Format
//!
//! | Field | Description |
//! |-------|-------------|
//! | `ts` | ISO 8601 timestamp (UTC) |
//! | `action` | What was attempted: `open_app`, `file_op_denied`, `set_mode`, ... |
//! | `status` | `ok`, `denied`, `error`, or `not_running` |
//! | `details` | Free-form object: target names, paths, denial `reason` |
//!
//! Appends take an exclusive advisory lock on the log and write the whole
//! line in a single call, so concurrent writers never interleave records.

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome recorded for an audited action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Ok,
    Denied,
    Error,
    NotRunning,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Ok => "ok",
            AuditStatus::Denied => "denied",
            AuditStatus::Error => "error",
            AuditStatus::NotRunning => "not_running",
        }
    }
}

impl std::str::FromStr for AuditStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ok" => Ok(AuditStatus::Ok),
            "denied" => Ok(AuditStatus::Denied),
            "error" => Ok(AuditStatus::Error),
            "not_running" => Ok(AuditStatus::NotRunning),
            other => anyhow::bail!("Unknown audit status: {}", other),
        }
    }
}

/// One line of the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// ISO 8601 timestamp of the event.
    pub ts: String,
    pub action: String,
    pub status: AuditStatus,
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl AuditRecord {
    /// Convenience accessor for the `reason` detail of denials.
    pub fn reason(&self) -> Option<&str> {
        self.details.get("reason").and_then(Value::as_str)
    }
}

/// Handle to the append-only log file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record. `details` should be a JSON object; any other value
    /// is stored under a `value` key.
    pub fn append(&self, action: &str, status: AuditStatus, details: Value) -> Result<()> {
        let record = AuditRecord {
            ts: chrono::Utc::now().to_rfc3339(),
            action: action.to_string(),
            status,
            details: into_object(details),
        };

        let mut line = serde_json::to_string(&record).context("Failed to serialize audit record")?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open audit log")?;
        file.lock_exclusive().context("Failed to lock audit log")?;
        let written = file.write_all(line.as_bytes());
        let _ = file.unlock();
        written.context("Failed to write audit record")?;

        Ok(())
    }

    /// Append a record, logging rather than propagating I/O failures.
    ///
    /// Used on decision paths where a full disk must not turn a denial into
    /// an allow or crash the conversational surface.
    pub fn record(&self, action: &str, status: AuditStatus, details: Value) {
        if let Err(e) = self.append(action, status, details) {
            tracing::warn!("Audit append failed for {}: {:#}", action, e);
        }
    }

    /// Read and parse all records.
    ///
    /// Corrupted lines are skipped (not fatal). Returns an empty vector if
    /// the log does not exist yet.
    pub fn read_all(&self) -> Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).context("Failed to read audit log")?;
        let records = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str::<AuditRecord>(line).ok())
            .collect();

        Ok(records)
    }
}

/// Read every parseable record from the log at `path`.
pub fn read_audit_log(path: &Path) -> Result<Vec<AuditRecord>> {
    AuditLog::new(path).read_all()
}

fn into_object(details: Value) -> Map<String, Value> {
    match details {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log_in(dir: &Path) -> AuditLog {
        AuditLog::new(dir.join("activity.jsonl"))
    }

    #[test]
    fn records_are_appended_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        log.append("open_app", AuditStatus::Ok, json!({"name": "notepad"}))
            .unwrap();
        log.append(
            "file_op_denied",
            AuditStatus::Denied,
            json!({"op": "delete", "reason": "path_not_allowed"}),
        )
        .unwrap();
        log.append("close_app", AuditStatus::NotRunning, json!({"name": "calc"}))
            .unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].action, "open_app");
        assert_eq!(records[1].status, AuditStatus::Denied);
        assert_eq!(records[1].reason(), Some("path_not_allowed"));
        assert_eq!(records[2].status, AuditStatus::NotRunning);
    }

    #[test]
    fn existing_lines_are_never_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        log.append("exit", AuditStatus::Ok, json!({})).unwrap();
        let before = fs::read_to_string(log.path()).unwrap();

        log.append("exit", AuditStatus::Denied, json!({})).unwrap();
        let after = fs::read_to_string(log.path()).unwrap();

        assert!(after.starts_with(&before));
        assert_eq!(after.lines().count(), 2);
    }

    #[test]
    fn status_serializes_snake_case() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());
        log.append("close_app", AuditStatus::NotRunning, Value::Null)
            .unwrap();

        let raw = fs::read_to_string(log.path()).unwrap();
        assert!(raw.contains("\"status\":\"not_running\""));
        assert!(raw.contains("\"details\":{}"));
        assert!(raw.contains("\"ts\":"));
    }

    #[test]
    fn corrupted_lines_skipped_in_read() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());

        log.append("open_app", AuditStatus::Ok, json!({})).unwrap();
        let mut file = fs::OpenOptions::new().append(true).open(log.path()).unwrap();
        writeln!(file, "not valid json garbage").unwrap();
        drop(file);
        log.append("close_app", AuditStatus::Ok, json!({})).unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].action, "close_app");
    }

    #[test]
    fn missing_log_reads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(log_in(tmp.path()).read_all().unwrap().is_empty());
        assert!(read_audit_log(&tmp.path().join("none.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn non_object_details_are_wrapped() {
        let tmp = tempfile::tempdir().unwrap();
        let log = log_in(tmp.path());
        log.append("list_dir", AuditStatus::Ok, json!(4)).unwrap();

        let records = log.read_all().unwrap();
        assert_eq!(records[0].details["value"], json!(4));
    }

    #[test]
    fn status_parses_from_cli_strings() {
        assert_eq!("denied".parse::<AuditStatus>().unwrap(), AuditStatus::Denied);
        assert_eq!(
            "NOT_RUNNING".parse::<AuditStatus>().unwrap(),
            AuditStatus::NotRunning
        );
        assert!("maybe".parse::<AuditStatus>().is_err());
    }
}
