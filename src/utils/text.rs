/// Cuts `value` to at most `max_chars` characters, appending a marker with the
/// number of characters dropped.
pub fn preview(value: &str, max_chars: usize) -> String {
    let total = value.chars().count();
    if total <= max_chars {
        return value.to_string();
    }
    let kept: String = value.chars().take(max_chars).collect();
    format!("{}...[+{} chars]", kept, total - max_chars)
}

/// Renders a JSON value for log output, bounded by `max_chars`.
pub fn preview_json(value: &serde_json::Value, max_chars: usize) -> String {
    let raw = serde_json::to_string(value).unwrap_or_default();
    preview(&raw, max_chars)
}
