use crate::constants::API_KEY_FALLBACK_FILE;
use crate::paths::resolve_config_path;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

const KEYRING_SERVICE: &str = "com.redraft.app.providers";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FileKeyStore {
    keys: HashMap<String, String>,
}

/// API key storage keyed by provider id.
///
/// The system keyring is the primary backend, one entry per provider id.
/// When the keyring is unavailable (headless session, no secret service) the
/// store degrades to a plain JSON file in the config directory, logged.
pub struct ApiKeyStore {
    fallback_path: PathBuf,
}

fn normalize_provider_id(provider_id: &str) -> Result<&str, String> {
    let trimmed = provider_id.trim();
    if trimmed.is_empty() {
        Err("Provider id cannot be empty".to_string())
    } else {
        Ok(trimmed)
    }
}

impl ApiKeyStore {
    pub fn new(fallback_path: PathBuf) -> Self {
        Self { fallback_path }
    }

    /// Store with its file fallback in the platform config directory.
    pub fn open_default() -> Self {
        Self::new(resolve_config_path(API_KEY_FALLBACK_FILE))
    }

    pub fn save(&self, provider_id: &str, api_key: &str) -> Result<(), String> {
        let provider_id = normalize_provider_id(provider_id)?;
        let key = api_key.trim();
        if key.is_empty() {
            return Err("API key cannot be empty".to_string());
        }

        if let Err(err) = try_store_in_keyring(provider_id, key) {
            warn!(
                "System keyring storage unavailable for provider '{}': {}. Falling back to file storage.",
                provider_id, err
            );
            let mut store = self.load_file_store()?;
            store.keys.insert(provider_id.to_string(), key.to_string());
            return self.save_file_store(&store);
        }

        // The keyring took it; make sure no stale plaintext copy lingers.
        let mut store = self.load_file_store()?;
        if store.keys.remove(provider_id).is_some() {
            self.save_file_store(&store)?;
        }
        Ok(())
    }

    pub fn read(&self, provider_id: &str) -> Result<Option<String>, String> {
        let provider_id = normalize_provider_id(provider_id)?;
        match try_read_from_keyring(provider_id) {
            Ok(Some(key)) if !key.trim().is_empty() => return Ok(Some(key)),
            Ok(_) => {}
            Err(err) => {
                warn!(
                    "System keyring read unavailable for provider '{}': {}. Falling back to file storage.",
                    provider_id, err
                );
            }
        }

        let store = self.load_file_store()?;
        Ok(store
            .keys
            .get(provider_id)
            .cloned()
            .filter(|value| !value.trim().is_empty()))
    }

    pub fn delete(&self, provider_id: &str) -> Result<(), String> {
        let provider_id = normalize_provider_id(provider_id)?;
        if let Err(err) = try_delete_from_keyring(provider_id) {
            warn!(
                "System keyring delete unavailable for provider '{}': {}. Cleaning file fallback.",
                provider_id, err
            );
        }

        let mut store = self.load_file_store()?;
        store.keys.remove(provider_id);
        self.save_file_store(&store)
    }

    fn load_file_store(&self) -> Result<FileKeyStore, String> {
        if !self.fallback_path.exists() {
            return Ok(FileKeyStore::default());
        }
        let raw = fs::read_to_string(&self.fallback_path)
            .map_err(|e| format!("Failed to read key store: {}", e))?;
        serde_json::from_str(&raw).map_err(|e| format!("Failed to parse key store: {}", e))
    }

    fn save_file_store(&self, store: &FileKeyStore) -> Result<(), String> {
        let raw = serde_json::to_string_pretty(store)
            .map_err(|e| format!("Failed to serialize key store: {}", e))?;
        fs::write(&self.fallback_path, raw).map_err(|e| format!("Failed to write key store: {}", e))
    }
}

fn try_store_in_keyring(provider_id: &str, api_key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider_id)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;
    entry
        .set_password(api_key)
        .map_err(|e| format!("Failed to store key in system keyring: {}", e))
}

fn try_read_from_keyring(provider_id: &str) -> Result<Option<String>, String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider_id)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(err) => Err(format!("Failed to read key from system keyring: {}", err)),
    }
}

fn try_delete_from_keyring(provider_id: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, provider_id)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;
    match entry.delete_password() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(format!("Failed to delete key from system keyring: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_provider_id_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ApiKeyStore::new(dir.path().join("api_keys.json"));
        assert!(store.save("  ", "sk-something").is_err());
        assert!(store.read("").is_err());
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ApiKeyStore::new(dir.path().join("api_keys.json"));
        assert!(store.save("default", "   ").is_err());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ApiKeyStore::new(dir.path().join("api_keys.json"));

        let mut file_store = store.load_file_store().unwrap();
        assert!(file_store.keys.is_empty());
        file_store
            .keys
            .insert("default".to_string(), "sk-test".to_string());
        store.save_file_store(&file_store).unwrap();

        let reloaded = store.load_file_store().unwrap();
        assert_eq!(reloaded.keys.get("default").map(String::as_str), Some("sk-test"));
    }
}
