use crate::models::RewriteAction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Two or more actions bound to the same accelerator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConflict {
    pub hotkey: String,
    pub actions: Vec<String>,
}

const VALID_MODIFIERS: [&str; 12] = [
    "CommandOrControl",
    "CmdOrCtrl",
    "Command",
    "Cmd",
    "Control",
    "Ctrl",
    "Alt",
    "Option",
    "AltGr",
    "Shift",
    "Super",
    "Meta",
];

/// Validates an accelerator string and returns its normalized form.
///
/// Global accelerators need at least one modifier, a bare key would swallow
/// normal typing.
pub fn validate_hotkey(key: &str) -> Result<String, String> {
    let key = key.trim();

    if key.is_empty() {
        return Err("Hotkey cannot be empty".to_string());
    }

    let parts: Vec<&str> = key.split('+').map(|s| s.trim()).collect();

    if parts.len() < 2 {
        return Err(
            "Hotkey must include at least one modifier (e.g., Ctrl, Shift, Alt)".to_string(),
        );
    }

    let key_part = parts.last().unwrap();
    let modifier_parts = &parts[..parts.len() - 1];

    for modifier in modifier_parts {
        if !VALID_MODIFIERS
            .iter()
            .any(|m| m.eq_ignore_ascii_case(modifier))
        {
            return Err(format!(
                "Invalid modifier: '{}'. Valid modifiers: Ctrl, Shift, Alt, Command, etc.",
                modifier
            ));
        }
    }

    if key_part.is_empty() {
        return Err("Missing key after modifiers".to_string());
    }

    Ok(format_hotkey(key))
}

/// Normalizes an accelerator to a consistent spelling
fn format_hotkey(key: &str) -> String {
    let parts: Vec<&str> = key.split('+').map(|s| s.trim()).collect();

    let formatted_parts: Vec<String> = parts
        .iter()
        .map(|part| match part.to_lowercase().as_str() {
            "ctrl" | "control" => "Ctrl".to_string(),
            "cmdorctrl" | "commandorcontrol" => "CommandOrControl".to_string(),
            "cmd" | "command" => "Command".to_string(),
            "alt" | "option" => "Alt".to_string(),
            "shift" => "Shift".to_string(),
            "meta" | "super" => "Meta".to_string(),
            _ => {
                // Capitalize first letter for the key itself
                let mut chars = part.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                }
            }
        })
        .collect();

    formatted_parts.join("+")
}

/// Finds accelerators bound to more than one enabled action. Disabled
/// actions keep their binding on disk but never register, so they cannot
/// conflict.
pub fn detect_conflicts(actions: &[RewriteAction]) -> Vec<HotkeyConflict> {
    let mut by_hotkey: HashMap<String, Vec<&RewriteAction>> = HashMap::new();
    for action in actions.iter().filter(|a| a.enabled) {
        let normalized = normalize_hotkey(&action.hotkey);
        if normalized.is_empty() {
            continue;
        }
        by_hotkey.entry(normalized).or_default().push(action);
    }

    let mut conflicts: Vec<HotkeyConflict> = by_hotkey
        .into_values()
        .filter(|bound| bound.len() > 1)
        .map(|bound| HotkeyConflict {
            hotkey: bound[0].hotkey.clone(),
            actions: bound.iter().map(|a| a.name.clone()).collect(),
        })
        .collect();
    conflicts.sort_by(|a, b| a.hotkey.cmp(&b.hotkey));
    conflicts
}

/// Normalizes an accelerator for comparison (lowercase, no whitespace)
fn normalize_hotkey(key: &str) -> String {
    key.to_lowercase().replace(' ', "")
}
