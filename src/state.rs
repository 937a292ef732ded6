use crate::constants::{
  KEY_ACTIONS,
  KEY_ACTIVE_PROVIDER_ID,
  KEY_CURRENT_ERROR,
  KEY_HAS_COMPLETED_ONBOARDING,
  KEY_IS_ENABLED,
  KEY_IS_PROCESSING,
  KEY_LEGACY_PROVIDER,
  KEY_PRIVACY_MODE,
  KEY_PROVIDERS,
  KEY_STATUS,
};
use crate::models::{
  default_actions, AppStatus, LegacyProviderConfig, ProviderConfig, RewriteAction,
};
use crate::store::SettingsStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

pub type Listener = Box<dyn Fn(&str) + Send + Sync>;

struct Inner {
  is_enabled: bool,
  is_processing: bool,
  status: AppStatus,
  current_error: Option<String>,
  privacy_mode: bool,
  has_completed_onboarding: bool,
  actions: Vec<RewriteAction>,
  providers: Vec<ProviderConfig>,
  active_provider_id: String,
}

impl Default for Inner {
  fn default() -> Self {
    let provider = ProviderConfig::default();
    Self {
      is_enabled: true,
      is_processing: false,
      status: AppStatus::Ready,
      current_error: None,
      privacy_mode: false,
      has_completed_onboarding: false,
      actions: default_actions(),
      active_provider_id: provider.id.clone(),
      providers: vec![provider],
    }
  }
}

/// Snapshot of the persisted fields, carried by each write-through.
#[derive(Clone)]
struct Snapshot {
  is_enabled: bool,
  privacy_mode: bool,
  has_completed_onboarding: bool,
  actions: Vec<RewriteAction>,
  providers: Vec<ProviderConfig>,
  active_provider_id: String,
}

/// In-memory aggregate of all user-configurable settings.
///
/// One instance is constructed at startup, `load()`ed before the first UI
/// read, and shared behind an `Arc`. Setters mutate in-memory state
/// synchronously, notify subscribers, and schedule a fire-and-forget
/// write-through of the full persisted snapshot; transient fields
/// (`is_processing`, `status`, `current_error`) notify but never persist.
pub struct AppState {
  store: Arc<SettingsStore>,
  inner: Mutex<Inner>,
  listeners: Mutex<Vec<Listener>>,
}

impl AppState {
  pub fn new(store: SettingsStore) -> Self {
    Self {
      store: Arc::new(store),
      inner: Mutex::new(Inner::default()),
      listeners: Mutex::new(Vec::new()),
    }
  }

  /// Registers a listener invoked with the logical key name of every changed
  /// field, persisted and transient alike. Listeners live for the process.
  pub fn subscribe(&self, listener: Listener) {
    self.listeners.lock().unwrap().push(listener);
  }

  fn notify(&self, key: &str) {
    for listener in self.listeners.lock().unwrap().iter() {
      listener(key);
    }
  }

  // --- Settings flags ---

  pub fn is_enabled(&self) -> bool {
    self.inner.lock().unwrap().is_enabled
  }

  pub fn set_enabled(&self, value: bool) {
    self.inner.lock().unwrap().is_enabled = value;
    self.notify(KEY_IS_ENABLED);
    self.schedule_save();
  }

  pub fn privacy_mode(&self) -> bool {
    self.inner.lock().unwrap().privacy_mode
  }

  pub fn set_privacy_mode(&self, value: bool) {
    self.inner.lock().unwrap().privacy_mode = value;
    self.notify(KEY_PRIVACY_MODE);
    self.schedule_save();
  }

  pub fn has_completed_onboarding(&self) -> bool {
    self.inner.lock().unwrap().has_completed_onboarding
  }

  pub fn set_completed_onboarding(&self, value: bool) {
    self.inner.lock().unwrap().has_completed_onboarding = value;
    self.notify(KEY_HAS_COMPLETED_ONBOARDING);
    self.schedule_save();
  }

  // --- Transient status (never persisted) ---

  pub fn is_processing(&self) -> bool {
    self.inner.lock().unwrap().is_processing
  }

  pub fn set_processing(&self, value: bool) {
    self.inner.lock().unwrap().is_processing = value;
    self.notify(KEY_IS_PROCESSING);
  }

  pub fn status(&self) -> AppStatus {
    self.inner.lock().unwrap().status
  }

  pub fn set_status(&self, value: AppStatus) {
    self.inner.lock().unwrap().status = value;
    self.notify(KEY_STATUS);
  }

  pub fn current_error(&self) -> Option<String> {
    self.inner.lock().unwrap().current_error.clone()
  }

  pub fn set_current_error(&self, value: Option<String>) {
    self.inner.lock().unwrap().current_error = value;
    self.notify(KEY_CURRENT_ERROR);
  }

  // --- Actions ---

  pub fn actions(&self) -> Vec<RewriteAction> {
    self.inner.lock().unwrap().actions.clone()
  }

  pub fn action(&self, id: &str) -> Option<RewriteAction> {
    self
      .inner
      .lock()
      .unwrap()
      .actions
      .iter()
      .find(|a| a.id == id)
      .cloned()
  }

  pub fn set_actions(&self, actions: Vec<RewriteAction>) {
    let actions = dedupe_by_id(actions, "action", |a: &RewriteAction| a.id.as_str());
    self.inner.lock().unwrap().actions = actions;
    self.notify(KEY_ACTIONS);
    self.schedule_save();
  }

  // --- Providers ---

  pub fn providers(&self) -> Vec<ProviderConfig> {
    self.inner.lock().unwrap().providers.clone()
  }

  /// Replaces the provider collection. An empty replacement is ignored: the
  /// collection must never become empty, or the active-provider fallback
  /// would have nothing to resolve to.
  pub fn set_providers(&self, providers: Vec<ProviderConfig>) {
    if providers.is_empty() {
      warn!("Ignoring attempt to replace the provider list with an empty list");
      return;
    }
    let mut providers = dedupe_by_id(providers, "provider", |p: &ProviderConfig| p.id.as_str());
    for provider in &mut providers {
      provider.normalize();
    }
    self.inner.lock().unwrap().providers = providers;
    self.notify(KEY_PROVIDERS);
    self.schedule_save();
  }

  pub fn active_provider_id(&self) -> String {
    self.inner.lock().unwrap().active_provider_id.clone()
  }

  pub fn set_active_provider_id(&self, id: String) {
    self.inner.lock().unwrap().active_provider_id = id;
    self.notify(KEY_ACTIVE_PROVIDER_ID);
    self.schedule_save();
  }

  /// The resolved active provider. Falls back to the first profile when the
  /// active id is dangling (e.g. the referenced profile was just deleted).
  pub fn provider(&self) -> ProviderConfig {
    let inner = self.inner.lock().unwrap();
    inner
      .providers
      .iter()
      .find(|p| p.id == inner.active_provider_id)
      .cloned()
      .unwrap_or_else(|| inner.providers.first().cloned().unwrap_or_default())
  }

  // --- Persistence ---

  /// Loads persisted settings, migrating older schema shapes. Invoked once at
  /// startup, before the first UI read. Never fails: anything that cannot be
  /// read keeps its compiled-in default, logged.
  pub fn load(&self) {
    let mut inner = self.inner.lock().unwrap();

    match self.store.get::<bool>(KEY_IS_ENABLED) {
      Ok(Some(value)) => inner.is_enabled = value,
      Ok(None) => {}
      Err(e) => warn!("Failed to load '{}': {}", KEY_IS_ENABLED, e),
    }
    match self.store.get::<bool>(KEY_PRIVACY_MODE) {
      Ok(Some(value)) => inner.privacy_mode = value,
      Ok(None) => {}
      Err(e) => warn!("Failed to load '{}': {}", KEY_PRIVACY_MODE, e),
    }
    match self.store.get::<bool>(KEY_HAS_COMPLETED_ONBOARDING) {
      Ok(Some(value)) => inner.has_completed_onboarding = value,
      Ok(None) => {}
      Err(e) => warn!("Failed to load '{}': {}", KEY_HAS_COMPLETED_ONBOARDING, e),
    }

    // An empty persisted list means "nothing saved yet", not "delete the
    // built-in defaults".
    match self.store.get::<Vec<RewriteAction>>(KEY_ACTIONS) {
      Ok(Some(saved)) if !saved.is_empty() => {
        inner.actions = dedupe_by_id(saved, "action", |a: &RewriteAction| a.id.as_str());
      }
      Ok(_) => {}
      Err(e) => warn!("Failed to load '{}': {}", KEY_ACTIONS, e),
    }

    self.load_providers(&mut inner);
  }

  /// Provider migration: current-schema sequence first, legacy single-provider
  /// record second, compiled-in default third. Detection is structural
  /// (presence of the current-schema key), not a stored version number.
  fn load_providers(&self, inner: &mut Inner) {
    match self.store.get::<Vec<ProviderConfig>>(KEY_PROVIDERS) {
      Ok(Some(saved)) if !saved.is_empty() => {
        let mut providers = dedupe_by_id(saved, "provider", |p: &ProviderConfig| p.id.as_str());
        for provider in &mut providers {
          provider.normalize();
        }
        inner.active_provider_id = match self.store.get::<String>(KEY_ACTIVE_PROVIDER_ID) {
          Ok(Some(id)) => id,
          Ok(None) => providers[0].id.clone(),
          Err(e) => {
            warn!("Failed to load '{}': {}", KEY_ACTIVE_PROVIDER_ID, e);
            providers[0].id.clone()
          }
        };
        inner.providers = providers;
      }
      Ok(_) => match self.store.get::<LegacyProviderConfig>(KEY_LEGACY_PROVIDER) {
        Ok(Some(legacy)) => {
          info!("Migrating legacy single-provider settings");
          let mut provider = legacy.into_provider();
          provider.normalize();
          inner.active_provider_id = provider.id.clone();
          inner.providers = vec![provider];
        }
        Ok(None) => {}
        Err(e) => warn!("Failed to load '{}': {}", KEY_LEGACY_PROVIDER, e),
      },
      Err(e) => warn!("Failed to load '{}': {}", KEY_PROVIDERS, e),
    }
  }

  /// Synchronous full save, for shutdown paths and tests. Best-effort: each
  /// key is written independently and failures are logged, never propagated.
  pub fn save_now(&self) {
    let snapshot = self.snapshot();
    persist_snapshot(&self.store, &snapshot);
  }

  fn snapshot(&self) -> Snapshot {
    let inner = self.inner.lock().unwrap();
    Snapshot {
      is_enabled: inner.is_enabled,
      privacy_mode: inner.privacy_mode,
      has_completed_onboarding: inner.has_completed_onboarding,
      actions: inner.actions.clone(),
      providers: inner.providers.clone(),
      active_provider_id: inner.active_provider_id.clone(),
    }
  }

  /// Fire-and-forget write-through. The caller never blocks on persistence
  /// and never observes its outcome; overlapping saves are tolerated because
  /// each one writes a complete snapshot.
  fn schedule_save(&self) {
    let store = Arc::clone(&self.store);
    let snapshot = self.snapshot();
    thread::spawn(move || persist_snapshot(&store, &snapshot));
  }
}

fn persist_snapshot(store: &SettingsStore, snapshot: &Snapshot) {
  if let Err(e) = store.set(KEY_IS_ENABLED, &snapshot.is_enabled) {
    warn!("Failed to persist '{}': {}", KEY_IS_ENABLED, e);
  }
  if let Err(e) = store.set(KEY_PRIVACY_MODE, &snapshot.privacy_mode) {
    warn!("Failed to persist '{}': {}", KEY_PRIVACY_MODE, e);
  }
  if let Err(e) = store.set(KEY_HAS_COMPLETED_ONBOARDING, &snapshot.has_completed_onboarding) {
    warn!("Failed to persist '{}': {}", KEY_HAS_COMPLETED_ONBOARDING, e);
  }
  if let Err(e) = store.set(KEY_ACTIONS, &snapshot.actions) {
    warn!("Failed to persist '{}': {}", KEY_ACTIONS, e);
  }
  if let Err(e) = store.set(KEY_PROVIDERS, &snapshot.providers) {
    warn!("Failed to persist '{}': {}", KEY_PROVIDERS, e);
  }
  if let Err(e) = store.set(KEY_ACTIVE_PROVIDER_ID, &snapshot.active_provider_id) {
    warn!("Failed to persist '{}': {}", KEY_ACTIVE_PROVIDER_ID, e);
  }
}

fn dedupe_by_id<T, F>(items: Vec<T>, kind: &str, id_of: F) -> Vec<T>
where
  F: Fn(&T) -> &str,
{
  let mut seen: HashSet<String> = HashSet::new();
  let mut out = Vec::with_capacity(items.len());
  for item in items {
    let id = id_of(&item);
    if seen.contains(id) {
      warn!("Dropping duplicate {} id '{}'", kind, id);
      continue;
    }
    seen.insert(id.to_string());
    out.push(item);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::constants::DEFAULT_PROVIDER_ID;
  use serde_json::json;
  use std::fs;
  use std::time::Duration;
  use tempfile::TempDir;

  fn state_in(dir: &TempDir) -> AppState {
    AppState::new(SettingsStore::new(dir.path().join("settings.json")))
  }

  fn write_doc(dir: &TempDir, doc: serde_json::Value) {
    fs::write(dir.path().join("settings.json"), doc.to_string()).unwrap();
  }

  fn sample_provider(id: &str) -> ProviderConfig {
    ProviderConfig {
      id: id.to_string(),
      name: format!("Provider {}", id),
      base_url: "https://llm.example.com".to_string(),
      model: "test-model".to_string(),
      timeout_secs: 15,
    }
  }

  #[test]
  fn empty_store_loads_compiled_defaults() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();

    assert_eq!(state.actions().len(), 2);
    let providers = state.providers();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].id, DEFAULT_PROVIDER_ID);
    assert_eq!(state.active_provider_id(), DEFAULT_PROVIDER_ID);
    assert!(state.is_enabled());
    assert!(!state.privacy_mode());
    assert!(!state.has_completed_onboarding());
    assert_eq!(state.status(), AppStatus::Ready);
    assert!(!state.is_processing());
    assert_eq!(state.current_error(), None);
  }

  #[test]
  fn current_schema_round_trips_exactly() {
    let dir = TempDir::new().unwrap();
    let providers = vec![sample_provider("a"), sample_provider("b")];
    write_doc(
      &dir,
      json!({
        "providers": providers,
        "activeProviderId": "b",
      }),
    );

    let state = state_in(&dir);
    state.load();

    assert_eq!(state.providers(), providers);
    assert_eq!(state.active_provider_id(), "b");
    assert_eq!(state.provider().id, "b");
  }

  #[test]
  fn missing_active_id_falls_back_to_first_provider() {
    let dir = TempDir::new().unwrap();
    write_doc(
      &dir,
      json!({ "providers": [sample_provider("a"), sample_provider("b")] }),
    );

    let state = state_in(&dir);
    state.load();
    assert_eq!(state.active_provider_id(), "a");
  }

  #[test]
  fn legacy_provider_migrates_to_default_id() {
    let dir = TempDir::new().unwrap();
    write_doc(
      &dir,
      json!({
        "provider": {"name": "X", "base_url": "u", "model": "m", "timeout_secs": 10}
      }),
    );

    let state = state_in(&dir);
    state.load();

    let providers = state.providers();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].id, "default");
    assert_eq!(providers[0].name, "X");
    assert_eq!(providers[0].base_url, "u");
    assert_eq!(providers[0].model, "m");
    assert_eq!(providers[0].timeout_secs, 10);
    assert_eq!(state.active_provider_id(), "default");
  }

  #[test]
  fn legacy_migration_is_idempotent_across_save() {
    let dir = TempDir::new().unwrap();
    write_doc(
      &dir,
      json!({
        "provider": {"name": "X", "base_url": "u", "model": "m", "timeout_secs": 10}
      }),
    );

    let first = state_in(&dir);
    first.load();
    let migrated = first.providers();
    first.save_now();

    let second = state_in(&dir);
    second.load();
    assert_eq!(second.providers(), migrated);
    assert_eq!(second.active_provider_id(), "default");

    // The legacy record is left in place, untouched.
    let raw = fs::read_to_string(dir.path().join("settings.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["provider"]["name"], "X");
  }

  #[test]
  fn dangling_active_id_resolves_to_first_provider() {
    let dir = TempDir::new().unwrap();
    write_doc(
      &dir,
      json!({
        "providers": [sample_provider("a"), sample_provider("b")],
        "activeProviderId": "deleted-long-ago",
      }),
    );

    let state = state_in(&dir);
    state.load();

    assert_eq!(state.active_provider_id(), "deleted-long-ago");
    assert_eq!(state.provider().id, "a");
  }

  #[test]
  fn empty_persisted_actions_keep_builtin_defaults() {
    let dir = TempDir::new().unwrap();
    write_doc(&dir, json!({ "actions": [] }));

    let state = state_in(&dir);
    state.load();
    assert_eq!(state.actions().len(), 2);
  }

  #[test]
  fn persisted_actions_replace_defaults_wholesale() {
    let dir = TempDir::new().unwrap();
    let mut action = default_actions().remove(0);
    action.id = "custom".to_string();
    action.name = "Custom".to_string();
    write_doc(&dir, json!({ "actions": [action] }));

    let state = state_in(&dir);
    state.load();

    let actions = state.actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].id, "custom");
  }

  #[test]
  fn privacy_flag_round_trips() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();
    state.set_privacy_mode(true);
    state.save_now();

    let reloaded = state_in(&dir);
    reloaded.load();
    assert!(reloaded.privacy_mode());
  }

  #[test]
  fn onboarding_latch_survives_reload() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();
    state.set_completed_onboarding(true);
    state.save_now();

    let reloaded = state_in(&dir);
    reloaded.load();
    assert!(reloaded.has_completed_onboarding());
  }

  #[test]
  fn transient_status_is_never_persisted() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();
    state.set_processing(true);
    state.set_status(AppStatus::Processing);
    state.set_current_error(Some("boom".to_string()));
    state.save_now();

    let reloaded = state_in(&dir);
    reloaded.load();
    assert!(!reloaded.is_processing());
    assert_eq!(reloaded.status(), AppStatus::Ready);
    assert_eq!(reloaded.current_error(), None);
  }

  #[test]
  fn setter_write_through_lands_on_disk() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();
    state.set_enabled(false);

    // The write-through is fire-and-forget; poll briefly for it to land.
    let path = dir.path().join("settings.json");
    for _ in 0..100 {
      if let Ok(raw) = fs::read_to_string(&path) {
        if let Ok(doc) = serde_json::from_str::<serde_json::Value>(&raw) {
          if doc["isEnabled"] == serde_json::Value::Bool(false) {
            return;
          }
        }
      }
      std::thread::sleep(Duration::from_millis(50));
    }
    panic!("write-through never committed isEnabled=false");
  }

  #[test]
  fn empty_provider_list_is_rejected() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();
    state.set_providers(Vec::new());
    assert_eq!(state.providers().len(), 1);
  }

  #[test]
  fn duplicate_provider_ids_are_dropped() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();

    let mut duplicate = sample_provider("a");
    duplicate.name = "Shadowed".to_string();
    state.set_providers(vec![sample_provider("a"), duplicate, sample_provider("b")]);

    let providers = state.providers();
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0].name, "Provider a");
  }

  #[test]
  fn setters_notify_subscribers_with_key_names() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&seen);
    state.subscribe(Box::new(move |key| sink.lock().unwrap().push(key.to_string())));

    state.set_enabled(false);
    state.set_status(AppStatus::Processing);
    state.set_active_provider_id("other".to_string());

    let seen = seen.lock().unwrap();
    assert_eq!(
      *seen,
      vec![
        KEY_IS_ENABLED.to_string(),
        KEY_STATUS.to_string(),
        KEY_ACTIVE_PROVIDER_ID.to_string(),
      ]
    );
  }

  #[test]
  fn in_memory_read_reflects_setter_immediately() {
    let dir = TempDir::new().unwrap();
    let state = state_in(&dir);
    state.load();
    state.set_enabled(false);
    assert!(!state.is_enabled());
    state.set_enabled(true);
    assert!(state.is_enabled());
  }
}
