use crate::constants::{HISTORY_FILE, MAX_HISTORY_ENTRIES};
use crate::errors::AppError;
use crate::paths::resolve_data_path;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// One completed rewrite, as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
  pub id: String,
  pub timestamp: String,
  pub action_name: String,
  pub app_name: String,
  pub original_text: String,
  pub result_text: String,
  pub provider: String,
  pub model: String,
  pub duration_ms: u64,
  pub tokens_used: Option<u64>,
}

/// The caller-supplied part of a history entry; id and timestamp are
/// stamped at push time.
#[derive(Debug, Clone)]
pub struct RewriteRecord {
  pub action_name: String,
  pub app_name: String,
  pub original_text: String,
  pub result_text: String,
  pub provider: String,
  pub model: String,
  pub duration_ms: u64,
  pub tokens_used: Option<u64>,
}

/// Rewrite history, newest first, persisted as its own JSON file and capped
/// to bound file size. The caller is responsible for the privacy gate: when
/// privacy mode is on, entries are never offered to `push` at all.
pub struct HistoryLog {
  path: PathBuf,
  entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryLog {
  pub fn open(path: PathBuf) -> Self {
    let entries = match fs::read_to_string(&path) {
      Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("History file at {} is malformed, starting empty: {}", path.display(), e);
        Vec::new()
      }),
      Err(_) => Vec::new(),
    };
    Self {
      path,
      entries: Mutex::new(entries),
    }
  }

  /// History backed by `history.json` in the platform data directory.
  pub fn open_default() -> Self {
    Self::open(resolve_data_path(HISTORY_FILE))
  }

  pub fn push(&self, record: RewriteRecord) -> Result<HistoryEntry, AppError> {
    let mut entries = self.entries.lock().unwrap();
    let entry = HistoryEntry {
      id: format!("h_{}", Utc::now().timestamp_millis()),
      timestamp: Utc::now().to_rfc3339(),
      action_name: record.action_name,
      app_name: record.app_name,
      original_text: record.original_text,
      result_text: record.result_text,
      provider: record.provider,
      model: record.model,
      duration_ms: record.duration_ms,
      tokens_used: record.tokens_used,
    };
    entries.insert(0, entry.clone());
    entries.truncate(MAX_HISTORY_ENTRIES);
    self.save_file(&entries)?;
    Ok(entry)
  }

  pub fn entries(&self) -> Vec<HistoryEntry> {
    self.entries.lock().unwrap().clone()
  }

  pub fn clear(&self) -> Result<(), AppError> {
    let mut entries = self.entries.lock().unwrap();
    entries.clear();
    self.save_file(&entries)
  }

  fn save_file(&self, entries: &[HistoryEntry]) -> Result<(), AppError> {
    let raw = serde_json::to_string_pretty(entries)
      .map_err(|e| AppError::Storage(format!("Failed to serialize history: {}", e)))?;
    fs::write(&self.path, raw)
      .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn sample_record(action_name: &str) -> RewriteRecord {
    RewriteRecord {
      action_name: action_name.to_string(),
      app_name: "TextEdit".to_string(),
      original_text: "teh text".to_string(),
      result_text: "the text".to_string(),
      provider: "Default".to_string(),
      model: "gpt-4o-mini".to_string(),
      duration_ms: 420,
      tokens_used: Some(37),
    }
  }

  #[test]
  fn push_persists_and_reloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let log = HistoryLog::open(path.clone());
    log.push(sample_record("Proofread")).unwrap();
    log.push(sample_record("Rewrite")).unwrap();

    let reloaded = HistoryLog::open(path);
    let entries = reloaded.entries();
    assert_eq!(entries.len(), 2);
    // Newest first.
    assert_eq!(entries[0].action_name, "Rewrite");
    assert_eq!(entries[1].action_name, "Proofread");
  }

  #[test]
  fn clear_empties_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");

    let log = HistoryLog::open(path.clone());
    log.push(sample_record("Proofread")).unwrap();
    log.clear().unwrap();
    assert!(log.entries().is_empty());

    let reloaded = HistoryLog::open(path);
    assert!(reloaded.entries().is_empty());
  }

  #[test]
  fn malformed_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    fs::write(&path, "[{broken").unwrap();

    let log = HistoryLog::open(path);
    assert!(log.entries().is_empty());
  }

  #[test]
  fn log_is_capped() {
    let dir = TempDir::new().unwrap();
    let log = HistoryLog::open(dir.path().join("history.json"));
    for i in 0..(MAX_HISTORY_ENTRIES + 10) {
      log.push(sample_record(&format!("action-{}", i))).unwrap();
    }
    assert_eq!(log.entries().len(), MAX_HISTORY_ENTRIES);
    // The newest entry survived the cap.
    assert_eq!(
      log.entries()[0].action_name,
      format!("action-{}", MAX_HISTORY_ENTRIES + 9)
    );
  }
}
