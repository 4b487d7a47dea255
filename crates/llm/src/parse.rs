//! Defensive parsing of model output.
//!
//! Completion responses are supposed to be bare JSON objects, but models
//! routinely wrap them in markdown code fences or prepend commentary. The
//! parse order is: strip fences, try a direct parse, then fall back to the
//! outermost brace-delimited region.

use serde_json::Value;

/// Extract a JSON object from raw model output.
///
/// Returns `None` when no strategy produces a JSON object. Non-object JSON
/// (arrays, strings) is rejected.
pub fn extract_json_object(content: &str) -> Option<Value> {
    let clean = strip_code_fences(content.trim());

    if let Ok(value) = serde_json::from_str::<Value>(clean) {
        if value.is_object() {
            return Some(value);
        }
    }

    // Fall back: outermost { ... } region
    let start = clean.find('{')?;
    let end = clean.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<Value>(&clean[start..=end])
        .ok()
        .filter(|v| v.is_object())
}

/// Strip a surrounding markdown code fence, if present.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` fences. The opening
/// fence line is dropped whole (it may carry a language tag).
fn strip_code_fences(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };

    // Drop the rest of the fence line (language tag)
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };

    // Drop the closing fence when present
    match body.rfind("```") {
        Some(pos) => &body[..pos],
        None => body,
    }
}
