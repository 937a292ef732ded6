use super::error::LlmError;
use crate::constants::{LLM_CONNECT_TIMEOUT_SECS, TEST_CONNECTION_TIMEOUT_SECS};
use crate::models::{ConnectionTestResult, LlmResponse};
use crate::postprocessing;
use std::time::{Duration, Instant};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 4096;

/// The LLM invocation seam. `HttpLlmClient` is the real implementation;
/// tests substitute their own.
pub trait LlmClient: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn call(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        timeout_secs: u64,
    ) -> Result<LlmResponse, LlmError>;
}

pub struct HttpLlmClient;

impl LlmClient for HttpLlmClient {
    fn call(
        &self,
        base_url: &str,
        api_key: &str,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        timeout_secs: u64,
    ) -> Result<LlmResponse, LlmError> {
        call_llm(base_url, api_key, model, system_prompt, user_prompt, timeout_secs)
    }
}

/// One blocking chat-completions call against an OpenAI-compatible endpoint.
///
/// The response text is cleaned through the post-processing pipeline before
/// it is returned; if nothing usable survives cleaning, the raw text is
/// returned as-is.
pub fn call_llm(
    base_url: &str,
    api_key: &str,
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
    timeout_secs: u64,
) -> Result<LlmResponse, LlmError> {
    let start = Instant::now();
    let url = format!("{}{}", base_url.trim_end_matches('/'), CHAT_COMPLETIONS_PATH);

    let body = serde_json::json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_prompt}
        ],
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS
    });

    let agent = ureq::builder()
        .timeout_connect(Duration::from_secs(LLM_CONNECT_TIMEOUT_SECS))
        .timeout_read(Duration::from_secs(timeout_secs.max(1)))
        .build();

    let resp = agent
        .post(&url)
        .set("Authorization", &format!("Bearer {}", api_key))
        .set("Content-Type", "application/json")
        .send_json(body)
        .map_err(|e| match e {
            ureq::Error::Status(401, _) => LlmError::InvalidApiKey,
            ureq::Error::Status(403, _) => LlmError::AccessDenied,
            ureq::Error::Status(404, resp) => {
                LlmError::ModelNotFound(resp.into_string().unwrap_or_default())
            }
            ureq::Error::Status(429, _) => LlmError::RateLimited,
            ureq::Error::Status(code, resp) if (500..=599).contains(&code) => {
                LlmError::ServerError(code, resp.into_string().unwrap_or_default())
            }
            ureq::Error::Status(code, resp) => {
                LlmError::Http(code, resp.into_string().unwrap_or_default())
            }
            ureq::Error::Transport(t) => {
                let msg = t.to_string();
                if msg.contains("timed out") || msg.contains("timeout") {
                    LlmError::Timeout
                } else {
                    LlmError::Connect(msg)
                }
            }
        })?;

    let duration_ms = start.elapsed().as_millis() as u64;

    let json: serde_json::Value = resp
        .into_json()
        .map_err(|e| LlmError::InvalidResponse(format!("failed to parse response body: {}", e)))?;

    let raw_text = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            LlmError::InvalidResponse("missing choices[0].message.content".to_string())
        })?
        .to_string();

    let tokens_used = json["usage"]["total_tokens"].as_u64();

    let text = postprocessing::normalize_response(&raw_text, user_prompt).unwrap_or(raw_text);

    Ok(LlmResponse {
        text,
        tokens_used,
        duration_ms,
    })
}

/// Fires a minimal completion to verify a profile end to end. Failure is
/// data, not an error: the UI renders the result either way.
pub fn test_connection(base_url: &str, api_key: &str, model: &str) -> ConnectionTestResult {
    let start = Instant::now();

    let result = call_llm(
        base_url,
        api_key,
        model,
        "You are a test assistant.",
        "Reply with exactly: OK",
        TEST_CONNECTION_TIMEOUT_SECS,
    );

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => ConnectionTestResult {
            success: true,
            latency_ms,
            model_name: model.to_string(),
            error: None,
        },
        Err(e) => ConnectionTestResult {
            success: false,
            latency_ms,
            model_name: model.to_string(),
            error: Some(e.to_string()),
        },
    }
}
