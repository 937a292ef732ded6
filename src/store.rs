use crate::constants::SETTINGS_FILE;
use crate::errors::AppError;
use crate::paths::resolve_config_path;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Durable key-value store over a single on-disk JSON document.
///
/// The document is read lazily, at most once per store instance, on the first
/// `get` or `set`. Every `set` rewrites the whole document before returning,
/// so a committed write survives an immediate crash. The store has no
/// knowledge of the schema it holds; values are opaque JSON.
pub struct SettingsStore {
  path: PathBuf,
  doc: Mutex<Option<Map<String, Value>>>,
}

impl SettingsStore {
  pub fn new(path: PathBuf) -> Self {
    Self {
      path,
      doc: Mutex::new(None),
    }
  }

  /// Store backed by `settings.json` in the platform config directory.
  pub fn open_default() -> Self {
    Self::new(resolve_config_path(SETTINGS_FILE))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Reads a key, decoding into `T`. Absent keys and explicit nulls read as
  /// `None`. A value that is present but does not match the expected shape
  /// also reads as `None` (logged), never as an error: old or hand-edited
  /// documents must not wedge the app.
  pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
    let mut doc = self.doc.lock().unwrap();
    let map = self.ensure_loaded(&mut doc)?;
    match map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
          warn!(
            "Persisted value for '{}' does not match the expected shape, treating as absent: {}",
            key, e
          );
          Ok(None)
        }
      },
    }
  }

  /// Writes a key and commits the whole document to disk before returning.
  pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
    let mut doc = self.doc.lock().unwrap();
    let map = self.ensure_loaded(&mut doc)?;
    let encoded = serde_json::to_value(value)
      .map_err(|e| AppError::Storage(format!("Failed to encode '{}': {}", key, e)))?;
    map.insert(key.to_string(), encoded);
    let raw = serde_json::to_string_pretty(&*map)
      .map_err(|e| AppError::Storage(format!("Failed to serialize settings: {}", e)))?;
    fs::write(&self.path, raw)
      .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e)))?;
    Ok(())
  }

  fn ensure_loaded<'a>(
    &self,
    doc: &'a mut Option<Map<String, Value>>,
  ) -> Result<&'a mut Map<String, Value>, AppError> {
    if doc.is_none() {
      let loaded = match fs::read_to_string(&self.path) {
        Ok(raw) => match serde_json::from_str::<Value>(&raw) {
          Ok(Value::Object(map)) => map,
          Ok(_) => {
            warn!(
              "Settings document at {} is not a JSON object, starting fresh",
              self.path.display()
            );
            Map::new()
          }
          Err(e) => {
            warn!(
              "Settings document at {} is malformed, starting fresh: {}",
              self.path.display(),
              e
            );
            Map::new()
          }
        },
        Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
        Err(e) => {
          return Err(AppError::Storage(format!(
            "Failed to read {}: {}",
            self.path.display(),
            e
          )));
        }
      };
      *doc = Some(loaded);
    }
    Ok(doc.as_mut().unwrap())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn store_in(dir: &TempDir) -> SettingsStore {
    SettingsStore::new(dir.path().join("settings.json"))
  }

  #[test]
  fn missing_file_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.get::<bool>("isEnabled").unwrap(), None);
  }

  #[test]
  fn set_commits_to_disk_before_returning() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.set("isEnabled", &false).unwrap();

    let raw = fs::read_to_string(dir.path().join("settings.json")).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["isEnabled"], Value::Bool(false));
  }

  #[test]
  fn set_preserves_unrelated_keys() {
    let dir = TempDir::new().unwrap();
    fs::write(
      dir.path().join("settings.json"),
      r#"{"privacyMode": true, "custom": 42}"#,
    )
    .unwrap();

    let store = store_in(&dir);
    store.set("isEnabled", &true).unwrap();

    assert_eq!(store.get::<bool>("privacyMode").unwrap(), Some(true));
    assert_eq!(store.get::<u64>("custom").unwrap(), Some(42));
  }

  #[test]
  fn shape_mismatch_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.json"), r#"{"isEnabled": "yes"}"#).unwrap();

    let store = store_in(&dir);
    assert_eq!(store.get::<bool>("isEnabled").unwrap(), None);
  }

  #[test]
  fn explicit_null_reads_as_absent() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.json"), r#"{"isEnabled": null}"#).unwrap();

    let store = store_in(&dir);
    assert_eq!(store.get::<bool>("isEnabled").unwrap(), None);
  }

  #[test]
  fn malformed_document_starts_fresh() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.json"), "not json at all {{{").unwrap();

    let store = store_in(&dir);
    assert_eq!(store.get::<bool>("isEnabled").unwrap(), None);
    store.set("isEnabled", &true).unwrap();
    assert_eq!(store.get::<bool>("isEnabled").unwrap(), Some(true));
  }

  #[test]
  fn document_is_read_once_per_instance() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("settings.json"), r#"{"privacyMode": false}"#).unwrap();

    let store = store_in(&dir);
    assert_eq!(store.get::<bool>("privacyMode").unwrap(), Some(false));

    // An external edit after first open is not observed by this handle.
    fs::write(dir.path().join("settings.json"), r#"{"privacyMode": true}"#).unwrap();
    assert_eq!(store.get::<bool>("privacyMode").unwrap(), Some(false));
  }
}
