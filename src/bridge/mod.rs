//! Native-bridge seams.
//!
//! The OS-specific collaborators (text selection, accessibility prompts,
//! global hotkey registration) are consumed through traits implemented by
//! the windowing shell; the portable collaborators (LLM invocation, API key
//! storage) are implemented here.

pub mod error;
pub mod keyring;
pub mod llm;

pub use error::LlmError;
pub use keyring::ApiKeyStore;
pub use llm::{HttpLlmClient, LlmClient};

/// Reading and replacing the user's current text selection, plus the
/// accessibility permission that gates both.
pub trait TextBridge: Send + Sync {
    fn get_selected_text(&self) -> Result<String, String>;
    fn replace_selected_text(&self, text: &str) -> Result<(), String>;
    fn check_accessibility_permission(&self) -> bool;
    fn request_accessibility_permission(&self) -> Result<(), String>;
    /// Name of the frontmost application, for history entries. Optional;
    /// shells that cannot tell report `None`.
    fn frontmost_app_name(&self) -> Option<String> {
        None
    }
}

/// OS-global hotkey registration.
pub trait HotkeyBridge: Send + Sync {
    fn register(&self, id: &str, shortcut: &str) -> Result<(), String>;
    fn unregister(&self, shortcut: &str) -> Result<(), String>;
    fn unregister_all(&self) -> Result<(), String>;
}
