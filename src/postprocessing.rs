// Response post-processing
//
// Chat models wrap their answers in artifacts that must never reach the
// user's document: markdown code fences, quotation marks around the whole
// answer, "Here's your rewrite:" boilerplate. This strips them in sequence:
// 1. Code-fence removal
// 2. Surrounding-quote removal
// 3. Boilerplate prefix removal

const BOILERPLATE_PREFIXES: [&str; 8] = [
    "Here's your rewrite:",
    "Here's the rewritten text:",
    "Here is your rewrite:",
    "Here is the rewritten text:",
    "Rewritten text:",
    "Sure, here's the rewrite:",
    "Sure! Here's the rewrite:",
    "Here you go:",
];

/// Cleans a raw model response before it replaces the user's selection.
///
/// Returns `None` when nothing usable remains: an empty result, or a result
/// identical to the input (the model echoed the prompt back). The caller
/// decides what to fall back to.
pub fn normalize_response(raw: &str, original: &str) -> Option<String> {
    let mut result = strip_code_fence(raw);
    result = strip_wrapping_quotes(&result);
    result = strip_boilerplate_prefix(&result);

    let result = result.trim().to_string();

    if result.is_empty() || result == original.trim() {
        None
    } else {
        Some(result)
    }
}

/// Removes a surrounding markdown code block, language tag included.
fn strip_code_fence(text: &str) -> String {
    let mut result = text.to_string();
    if result.starts_with("```") {
        if let Some(pos) = result.find('\n') {
            result = result[pos + 1..].to_string();
        }
        if let Some(pos) = result.rfind("```") {
            result = result[..pos].to_string();
        }
    }
    result
}

fn strip_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

fn strip_boilerplate_prefix(text: &str) -> String {
    for prefix in &BOILERPLATE_PREFIXES {
        if let Some(stripped) = text.trim().strip_prefix(prefix) {
            return stripped.to_string();
        }
    }
    text.to_string()
}
