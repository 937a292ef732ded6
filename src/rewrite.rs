//! One rewrite, end to end: selection in, rewritten text out.

use crate::bridge::{ApiKeyStore, HotkeyBridge, LlmClient, TextBridge};
use crate::constants::TEMPLATE_MARKER;
use crate::errors::AppError;
use crate::history::{HistoryLog, RewriteRecord};
use crate::hotkeys;
use crate::models::AppStatus;
use crate::state::AppState;
use tracing::{error, info, warn};

/// Runs one rewrite action against the current selection.
///
/// Drives the container's transient status for the whole invocation:
/// processing while the call is in flight, back to ready afterwards, with
/// `current_error` holding the failure message (also returned) or cleared
/// on success.
pub fn run_action(
    state: &AppState,
    text: &dyn TextBridge,
    llm: &dyn LlmClient,
    api_keys: &ApiKeyStore,
    history: &HistoryLog,
    action_id: &str,
) -> Result<String, AppError> {
    if !state.is_enabled() {
        return Err(AppError::Other("Rewriting is disabled".to_string()));
    }
    if !text.check_accessibility_permission() {
        state.set_status(AppStatus::NotReady);
        return Err(AppError::Permission(
            "Accessibility permission not granted".to_string(),
        ));
    }

    state.set_processing(true);
    state.set_status(AppStatus::Processing);

    let result = perform(state, text, llm, api_keys, history, action_id);

    state.set_processing(false);
    state.set_status(AppStatus::Ready);
    match &result {
        Ok(_) => state.set_current_error(None),
        Err(e) => {
            error!("Rewrite failed: {}", e);
            state.set_current_error(Some(e.to_string()));
        }
    }

    result
}

fn perform(
    state: &AppState,
    text: &dyn TextBridge,
    llm: &dyn LlmClient,
    api_keys: &ApiKeyStore,
    history: &HistoryLog,
    action_id: &str,
) -> Result<String, AppError> {
    let action = state
        .action(action_id)
        .ok_or_else(|| AppError::Other(format!("Unknown action: {}", action_id)))?;
    if !action.enabled {
        return Err(AppError::Other(format!("Action '{}' is disabled", action.name)));
    }

    let selection = text.get_selected_text().map_err(AppError::Selection)?;
    if selection.trim().is_empty() {
        return Err(AppError::Selection("No text selected".to_string()));
    }

    let provider = state.provider();
    let api_key = match api_keys.read(&provider.id) {
        Ok(Some(key)) => key,
        Ok(None) => String::new(),
        Err(e) => {
            // Local endpoints work without a key; let the call proceed.
            warn!("API key lookup failed for provider '{}': {}", provider.id, e);
            String::new()
        }
    };

    let user_prompt = action.user_template.replace(TEMPLATE_MARKER, &selection);
    let response = llm
        .call(
            &provider.base_url,
            &api_key,
            &provider.model,
            &action.system_prompt,
            &user_prompt,
            provider.timeout_secs,
        )
        .map_err(|e| AppError::Network(e.to_string()))?;

    text.replace_selected_text(&response.text)
        .map_err(AppError::Selection)?;

    if state.privacy_mode() {
        info!("Privacy mode on, skipping history entry");
    } else {
        let record = RewriteRecord {
            action_name: action.name.clone(),
            app_name: text.frontmost_app_name().unwrap_or_default(),
            original_text: selection,
            result_text: response.text.clone(),
            provider: provider.name.clone(),
            model: provider.model.clone(),
            duration_ms: response.duration_ms,
            tokens_used: response.tokens_used,
        };
        if let Err(e) = history.push(record) {
            warn!("Failed to record history entry: {}", e);
        }
    }

    Ok(response.text)
}

/// Re-registers global hotkeys from the current action list.
///
/// Everything is unregistered first to avoid conflicts with stale bindings,
/// then each enabled action's accelerator is validated and registered.
/// Failures are logged and skipped, never fatal: a conflicting hotkey must
/// not take the rest of the app down.
pub fn sync_hotkeys(state: &AppState, bridge: &dyn HotkeyBridge) {
    if let Err(e) = bridge.unregister_all() {
        warn!("Failed to unregister all hotkeys (may be OK if none registered): {}", e);
    }

    let actions = state.actions();
    for conflict in hotkeys::detect_conflicts(&actions) {
        warn!(
            "Hotkey '{}' is bound to multiple actions: {}",
            conflict.hotkey,
            conflict.actions.join(", ")
        );
    }

    for action in actions.iter().filter(|a| a.enabled) {
        let formatted = match hotkeys::validate_hotkey(&action.hotkey) {
            Ok(formatted) => formatted,
            Err(e) => {
                warn!("Skipping hotkey for action '{}': {}", action.name, e);
                continue;
            }
        };
        match bridge.register(&action.id, &formatted) {
            Ok(()) => info!("Registered hotkey '{}' for action '{}'", formatted, action.name),
            Err(e) => warn!(
                "Failed to register hotkey '{}' for action '{}': {}",
                formatted, action.name, e
            ),
        }
    }
}
