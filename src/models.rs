use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_PROVIDER_ID, DEFAULT_TIMEOUT_SECS, TEMPLATE_MARKER};

/// Lifecycle state of the rewrite feature, surfaced to the frontend.
/// Not persisted; resets to `Ready` on every launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppStatus {
    #[default]
    Ready,
    Processing,
    NotReady,
}

/// A user-defined text transformation rule.
///
/// `id` is stable and never reused; the Vec order is the display/priority
/// order and survives save/load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteAction {
    pub id: String,
    pub name: String,
    pub hotkey: String,
    pub system_prompt: String,
    pub user_template: String,
    pub output_rules: String,
    pub enabled: bool,
}

impl RewriteAction {
    /// Checks the fields a broken frontend or hand-edited settings file could
    /// plausibly corrupt. The template must keep the substitution marker,
    /// otherwise the selected text would never reach the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Action id cannot be empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("Action name cannot be empty".to_string());
        }
        if !self.user_template.contains(TEMPLATE_MARKER) {
            return Err(format!(
                "Action '{}' template is missing the {} marker",
                self.name, TEMPLATE_MARKER
            ));
        }
        Ok(())
    }
}

/// A named LLM endpoint profile (current schema, with `id`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROVIDER_ID.to_string(),
            name: "Default".to_string(),
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Clamps fields into usable shape without rejecting the profile.
    pub fn normalize(&mut self) {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed != self.base_url {
            self.base_url = trimmed.to_string();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Provider id cannot be empty".to_string());
        }
        Url::parse(&self.base_url)
            .map_err(|e| format!("Provider '{}' has an invalid base URL: {}", self.name, e))?;
        Ok(())
    }
}

/// Pre-0.3 persisted provider record: a single implicit profile, no `id`.
/// Only ever deserialized, during migration.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LegacyProviderConfig {
    pub(crate) name: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) timeout_secs: u64,
}

impl LegacyProviderConfig {
    pub(crate) fn into_provider(self) -> ProviderConfig {
        ProviderConfig {
            id: DEFAULT_PROVIDER_ID.to_string(),
            name: self.name,
            base_url: self.base_url,
            model: self.model,
            timeout_secs: self.timeout_secs,
        }
    }
}

/// The two built-in actions seeded on first run.
pub fn default_actions() -> Vec<RewriteAction> {
    vec![
        RewriteAction {
            id: "default-proofread".to_string(),
            name: "Proofread".to_string(),
            hotkey: "CommandOrControl+Shift+1".to_string(),
            system_prompt: "You are a meticulous proofreader. Fix all spelling, grammar, and \
                            punctuation errors. Preserve the original tone and meaning. Only \
                            output the corrected text, nothing else."
                .to_string(),
            user_template: TEMPLATE_MARKER.to_string(),
            output_rules: "Output only the corrected text. No explanations.".to_string(),
            enabled: true,
        },
        RewriteAction {
            id: "default-rewrite".to_string(),
            name: "Rewrite".to_string(),
            hotkey: "CommandOrControl+Shift+2".to_string(),
            system_prompt: "You are a skilled editor. Rewrite the given text to improve clarity, \
                            readability, and flow. Simplify complex sentences, remove ambiguity, \
                            and make the meaning immediately clear. Preserve the original intent \
                            and information. Only output the rewritten text, nothing else."
                .to_string(),
            user_template: TEMPLATE_MARKER.to_string(),
            output_rules: "Output only the rewritten text. No explanations.".to_string(),
            enabled: true,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub tokens_used: Option<u64>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub latency_ms: u64,
    pub model_name: String,
    pub error: Option<String>,
}
