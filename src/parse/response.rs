// Helpers for reading generateContent response payloads.

use serde_json::Value;

/// Concatenated text parts of the first candidate.
///
/// Returns `None` when there is no candidate or the candidate carries no text
/// part at all. An empty string part still counts as text.
pub fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let mut out = String::new();
    let mut found = false;
    for part in parts {
        if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
            out.push_str(text);
            found = true;
        }
    }
    found.then_some(out)
}

/// Why the service refused to answer, if it said so.
pub fn extract_block_reason(payload: &Value) -> Option<String> {
    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|v| v.get("blockReason"))
        .and_then(|v| v.as_str())
    {
        return Some(format!("prompt blocked: {reason}"));
    }

    let finish = payload
        .get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("finishReason"))
        .and_then(|v| v.as_str())?;
    matches!(finish, "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")
        .then(|| format!("candidate blocked: {finish}"))
}

/// Error message from a non-2xx body (`{"error": {"message": ...}}`).
pub fn extract_error_message(payload: &Value) -> Option<String> {
    let error = payload.get("error")?;
    if let Some(msg) = error.get("message").and_then(|v| v.as_str()) {
        return Some(msg.to_string());
    }
    error.as_str().map(|s| s.to_string())
}

pub fn extract_usage_line(payload: &Value) -> String {
    if let Some(usage) = payload.get("usageMetadata") {
        let input = usage
            .get("promptTokenCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let output = usage
            .get("candidatesTokenCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        let total = usage
            .get("totalTokenCount")
            .and_then(|v| v.as_u64())
            .unwrap_or(input + output);
        return format!("usage(input={input}, output={output}, total={total})");
    }
    "usage(unknown)".to_string()
}
