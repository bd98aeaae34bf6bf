//! Transforms an Anthropic Messages SSE byte stream into OpenAI-compatible
//! streaming chunks.
//!
//! The state machine mirrors the documented Anthropic event ordering:
//! `message_start → (content_block_start → content_block_delta* →
//! content_block_stop)* → message_delta → message_stop`. Only `text_delta`
//! content is surfaced; `thinking`/`tool_use` blocks are out of scope and
//! are silently dropped.

use crate::translate::stop_reason::map_stop_reason;
use crate::translate::types::generate_completion_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Streaming,
    Done,
}

/// Parses the blank-line-delimited SSE wire format into `(event, data)` pairs.
/// Handles multi-line `data:` fields (joined with `\n`) and a trailing event
/// with no terminating blank line.
pub fn parse_sse_lines(raw: &str) -> Vec<(String, String)> {
    let mut events = Vec::new();
    for record in raw.split("\n\n") {
        if record.trim().is_empty() {
            continue;
        }
        let mut event_type = String::new();
        let mut data_lines = Vec::new();
        for line in record.split('\n') {
            if let Some(rest) = line.strip_prefix("event:") {
                event_type = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.trim_start().to_string());
            }
        }
        if !event_type.is_empty() {
            events.push((event_type, data_lines.join("\n")));
        }
    }
    events
}

/// Incremental bridge from Anthropic SSE events to OpenAI SSE chunk lines.
pub struct StreamBridge {
    state: State,
    buffer: String,
    id: String,
    created: i64,
    model: String,
    stop_reason: Option<String>,
}

impl StreamBridge {
    pub fn new(model: impl Into<String>, created: i64) -> Self {
        Self {
            state: State::Idle,
            buffer: String::new(),
            id: generate_completion_id(),
            created,
            model: model.into(),
            stop_reason: None,
        }
    }

    /// Feed a raw chunk of upstream bytes (of any size — arbitrary boundary
    /// splits are handled by buffering across calls). Returns zero or more
    /// fully formed `data: ...\n\n` lines ready to write to the client.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut out = Vec::new();

        while let Some(idx) = self.buffer.find("\n\n") {
            let record = self.buffer[..idx].to_string();
            self.buffer.drain(..idx + 2);
            out.extend(self.process_record(&record));
        }

        out
    }

    /// Flush any remaining buffered partial record at end of stream. Used
    /// when the upstream connection closes without a trailing blank line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        if !self.buffer.trim().is_empty() {
            let record = std::mem::take(&mut self.buffer);
            out.extend(self.process_record(&record));
        }
        out
    }

    fn process_record(&mut self, record: &str) -> Vec<String> {
        if self.state == State::Done {
            return Vec::new();
        }

        let mut event_type = String::new();
        let mut data_lines = Vec::new();
        for line in record.split('\n') {
            if let Some(rest) = line.strip_prefix("event:") {
                event_type = rest.trim().to_string();
            } else if let Some(rest) = line.strip_prefix("data:") {
                data_lines.push(rest.trim_start().to_string());
            }
        }
        if event_type.is_empty() {
            return Vec::new();
        }
        let data = data_lines.join("\n");
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&data) else {
            return Vec::new();
        };

        self.handle_event(&event_type, &value)
    }

    fn handle_event(&mut self, event_type: &str, value: &serde_json::Value) -> Vec<String> {
        match (self.state, event_type) {
            (State::Idle, "message_start") => {
                self.state = State::Streaming;
                vec![self.chunk(serde_json::json!({"role": "assistant", "content": ""}), None)]
            }
            (State::Streaming, "content_block_delta") => {
                if value["delta"]["type"] == "text_delta" {
                    if let Some(text) = value["delta"]["text"].as_str() {
                        return vec![self.chunk(serde_json::json!({"content": text}), None)];
                    }
                }
                Vec::new()
            }
            (State::Streaming, "message_delta") => {
                if let Some(reason) = value["delta"]["stop_reason"].as_str() {
                    self.stop_reason = Some(reason.to_string());
                }
                Vec::new()
            }
            (State::Streaming, "message_stop") => {
                self.state = State::Done;
                let finish = map_stop_reason(self.stop_reason.as_deref());
                let final_chunk = self.chunk(serde_json::json!({}), Some(finish));
                vec![final_chunk, "data: [DONE]\n\n".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Terminate the stream early after an upstream read failure. Emits a
    /// final chunk carrying `finish_reason: "stop"` plus an `error`
    /// annotation, followed by the `[DONE]` sentinel, so every stream still
    /// ends the same way regardless of how it stopped. A no-op once the
    /// stream has already reached `Done`.
    pub fn error_chunk(&mut self, message: impl Into<String>) -> Vec<String> {
        if self.state == State::Done {
            return Vec::new();
        }
        self.state = State::Done;

        let body = serde_json::json!({
            "id": self.id,
            "object": "chat.completion.chunk",
            "created": self.created,
            "model": self.model,
            "choices": [{
                "index": 0,
                "delta": {},
                "finish_reason": "stop",
            }],
            "error": {"message": message.into()},
        });
        vec![format!("data: {body}\n\n"), "data: [DONE]\n\n".to_string()]
    }

    fn chunk(&self, delta: serde_json::Value, finish_reason: Option<&'static str>) -> String {
        let body = serde_json::json!({
            "id": self.id,
            "object": "chat.completion.chunk",
            "created": self.created,
            "model": self.model,
            "choices": [{
                "index": 0,
                "delta": delta,
                "finish_reason": finish_reason,
            }],
        });
        format!("data: {body}\n\n")
    }
}
