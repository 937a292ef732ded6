use std::fs;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "redraft";

fn resolve_override(var: &str) -> Option<PathBuf> {
  let dir = std::env::var(var).ok()?;
  let trimmed = dir.trim();
  if trimmed.is_empty() {
    return None;
  }
  let path = PathBuf::from(trimmed);
  if fs::create_dir_all(&path).is_ok() {
    Some(path)
  } else {
    None
  }
}

pub fn config_dir() -> PathBuf {
  if let Some(dir) = resolve_override("REDRAFT_CONFIG_DIR") {
    return dir;
  }
  let base = dirs::config_dir()
    .map(|d| d.join(APP_DIR_NAME))
    .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
  let _ = fs::create_dir_all(&base);
  base
}

pub fn data_dir() -> PathBuf {
  if let Some(dir) = resolve_override("REDRAFT_DATA_DIR") {
    return dir;
  }
  let base = dirs::data_dir()
    .map(|d| d.join(APP_DIR_NAME))
    .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
  let _ = fs::create_dir_all(&base);
  base
}

pub fn resolve_config_path(filename: &str) -> PathBuf {
  config_dir().join(filename)
}

pub fn resolve_data_path(filename: &str) -> PathBuf {
  data_dir().join(filename)
}
