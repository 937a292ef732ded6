pub const SETTINGS_FILE: &str = "settings.json";
pub const HISTORY_FILE: &str = "history.json";
pub const API_KEY_FALLBACK_FILE: &str = "api_keys.json";

// Persisted document keys. The frontend reads the same names, keep them stable.
pub const KEY_IS_ENABLED: &str = "isEnabled";
pub const KEY_PRIVACY_MODE: &str = "privacyMode";
pub const KEY_HAS_COMPLETED_ONBOARDING: &str = "hasCompletedOnboarding";
pub const KEY_ACTIONS: &str = "actions";
pub const KEY_PROVIDERS: &str = "providers";
pub const KEY_ACTIVE_PROVIDER_ID: &str = "activeProviderId";
// Pre-0.3 single-provider record. Read for migration, never written back.
pub const KEY_LEGACY_PROVIDER: &str = "provider";

// Transient field names, used for change notifications only.
pub const KEY_IS_PROCESSING: &str = "isProcessing";
pub const KEY_STATUS: &str = "status";
pub const KEY_CURRENT_ERROR: &str = "currentError";

// Marker substituted with the selected text inside an action's user template.
pub const TEMPLATE_MARKER: &str = "{{text}}";

pub const DEFAULT_PROVIDER_ID: &str = "default";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const MAX_HISTORY_ENTRIES: usize = 500;

pub const LLM_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const TEST_CONNECTION_TIMEOUT_SECS: u64 = 10;
