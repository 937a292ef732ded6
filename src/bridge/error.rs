use std::fmt;

#[derive(Debug, Clone)]
pub enum LlmError {
    InvalidApiKey,
    AccessDenied,
    ModelNotFound(String),
    RateLimited,
    ServerError(u16, String),
    Http(u16, String),
    Timeout,
    Connect(String),
    InvalidResponse(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::InvalidApiKey => {
                write!(f, "Invalid API key. Check your API key in settings.")
            }
            LlmError::AccessDenied => write!(
                f,
                "Access denied. Your API key may not have permission for this model."
            ),
            LlmError::ModelNotFound(body) => write!(
                f,
                "Model not found. Check the model name in settings. Response: {}",
                body
            ),
            LlmError::RateLimited => write!(f, "Rate limited. Please wait and try again."),
            LlmError::ServerError(status, body) => {
                write!(f, "Provider server error ({}): {}", status, body)
            }
            LlmError::Http(status, body) => write!(f, "API error ({}): {}", status, body),
            LlmError::Timeout => write!(
                f,
                "Request timed out. Check your provider URL and network connection."
            ),
            LlmError::Connect(message) => {
                write!(f, "Connection failed: {}. Check your provider URL.", message)
            }
            LlmError::InvalidResponse(message) => {
                write!(f, "Unexpected provider response: {}", message)
            }
        }
    }
}

impl std::error::Error for LlmError {}
