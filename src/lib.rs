// Redraft - application state and native-bridge layer

pub mod bridge;
pub mod constants;
pub mod errors;
pub mod history;
pub mod hotkeys;
pub mod models;
pub mod paths;
pub mod postprocessing;
pub mod rewrite;
pub mod state;
pub mod store;
pub mod theme;

pub use bridge::llm::{call_llm, test_connection};
pub use bridge::{ApiKeyStore, HotkeyBridge, HttpLlmClient, LlmClient, LlmError, TextBridge};
pub use errors::{AppError, ErrorEvent};
pub use history::{HistoryEntry, HistoryLog, RewriteRecord};
pub use models::{
    default_actions, AppStatus, ConnectionTestResult, LlmResponse, ProviderConfig, RewriteAction,
};
pub use state::AppState;
pub use store::SettingsStore;
pub use theme::{Theme, ThemeMirror, ThemeSource};

use tracing::info;

pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Redraft state layer starting up");
}
