//! Anthropic `stop_reason` → OpenAI `finish_reason` mapping.

/// Map an Anthropic stop reason to the OpenAI finish reason it corresponds
/// to. Anything unrecognized (including an absent reason) maps to `"stop"`.
pub fn map_stop_reason(stop_reason: Option<&str>) -> &'static str {
    match stop_reason {
        Some("end_turn") | Some("stop_sequence") => "stop",
        Some("max_tokens") => "length",
        Some("tool_use") => "tool_calls",
        _ => "stop",
    }
}
