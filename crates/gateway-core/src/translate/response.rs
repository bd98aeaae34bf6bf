//! Anthropic Messages response → OpenAI Chat Completions response.

use super::stop_reason::map_stop_reason;
use super::types::{
    AnthropicContentBlock, AnthropicResponse, ChatCompletionResponse, ChatMessage, Choice, Usage,
    generate_completion_id,
};

pub fn from_anthropic_response(
    resp: &AnthropicResponse,
    model: &str,
    created: i64,
) -> ChatCompletionResponse {
    let content = resp
        .content
        .iter()
        .filter_map(|block| match block {
            AnthropicContentBlock::Text { text } => Some(text.as_str()),
            AnthropicContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    ChatCompletionResponse {
        id: generate_completion_id(),
        object: "chat.completion",
        created,
        model: model.to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChatMessage { role: "assistant", content },
            finish_reason: map_stop_reason(resp.stop_reason.as_deref()),
        }],
        usage: Usage::from_anthropic(&resp.usage),
    }
}
