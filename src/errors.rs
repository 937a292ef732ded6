use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-wide error types with categories for better error handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Settings/history storage errors
    Storage(String),

    /// Network errors (LLM call, connection test, etc.)
    Network(String),

    /// Hotkey registration/validation errors
    Hotkey(String),

    /// API key storage errors (system keyring or file fallback)
    Keychain(String),

    /// Accessibility permission missing or denied
    Permission(String),

    /// Text selection read/replace errors
    Selection(String),

    /// Generic errors that don't fit other categories
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Storage(msg) => write!(f, "Storage Error: {}", msg),
            AppError::Network(msg) => write!(f, "Network Error: {}", msg),
            AppError::Hotkey(msg) => write!(f, "Hotkey Error: {}", msg),
            AppError::Keychain(msg) => write!(f, "Keychain Error: {}", msg),
            AppError::Permission(msg) => write!(f, "Permission Error: {}", msg),
            AppError::Selection(msg) => write!(f, "Selection Error: {}", msg),
            AppError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Returns a user-friendly title for the error
    pub fn title(&self) -> &str {
        match self {
            AppError::Storage(_) => "Storage Error",
            AppError::Network(_) => "Network Problem",
            AppError::Hotkey(_) => "Hotkey Problem",
            AppError::Keychain(_) => "Keychain Error",
            AppError::Permission(_) => "Permission Required",
            AppError::Selection(_) => "Text Selection Failed",
            AppError::Other(_) => "Error",
        }
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        match self {
            AppError::Storage(msg)
            | AppError::Network(msg)
            | AppError::Hotkey(msg)
            | AppError::Keychain(msg)
            | AppError::Permission(msg)
            | AppError::Selection(msg)
            | AppError::Other(msg) => msg,
        }
    }

    /// Returns whether this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Storage(_) => true,    // Might be transient disk issue
            AppError::Network(_) => true,    // Network might recover
            AppError::Hotkey(_) => false,    // Hotkey conflicts need manual fix
            AppError::Keychain(_) => true,   // Keyring daemon might come back
            AppError::Permission(_) => false, // Needs a user decision
            AppError::Selection(_) => true,  // Focus/selection changes constantly
            AppError::Other(_) => false,     // Unknown errors, don't retry
        }
    }
}

/// Convert from String to AppError::Other
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::Other(error)
    }
}

/// Convert from &str to AppError::Other
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Other(error.to_string())
    }
}

/// Error event payload sent to the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub error: AppError,
    pub timestamp: u64,
    pub context: Option<String>,
}

impl ErrorEvent {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
