//! OpenAI Chat Completions request → Anthropic Messages request.

use crate::errors::GatewayError;

use super::types::{AnthropicContentBlock, AnthropicMessage, AnthropicRequest, OpenAiChatRequest};

/// Translate a validated OpenAI request into the Anthropic shape.
///
/// System messages (wherever they appear in the sequence) are folded into
/// a single `system` prefix, joined with blank lines; their original
/// positions among the other messages are not preserved.
pub fn to_anthropic_request(
    req: &OpenAiChatRequest,
    default_max_tokens: u32,
) -> Result<AnthropicRequest, GatewayError> {
    if req.model.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("model must not be empty".into()));
    }
    if req.messages.is_empty() {
        return Err(GatewayError::InvalidRequest("messages must not be empty".into()));
    }

    let mut system_parts = Vec::new();
    let mut messages = Vec::new();

    for msg in &req.messages {
        match msg.role.as_str() {
            "system" => system_parts.push(msg.content.clone()),
            "user" | "assistant" => messages.push(AnthropicMessage {
                role: msg.role.clone(),
                content: vec![AnthropicContentBlock::Text { text: msg.content.clone() }],
            }),
            other => {
                return Err(GatewayError::InvalidRequest(format!(
                    "unsupported message role: {other}"
                )))
            }
        }
    }

    if messages.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "at least one user or assistant message is required".into(),
        ));
    }
    if messages[0].role != "user" {
        return Err(GatewayError::InvalidRequest(
            "the first non-system message must have role \"user\"".into(),
        ));
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    let max_tokens = req
        .max_tokens
        .or(req.max_completion_tokens)
        .unwrap_or(default_max_tokens);

    Ok(AnthropicRequest {
        model: req.model.clone(),
        system,
        messages,
        max_tokens,
        temperature: req.temperature,
        top_p: req.top_p,
        stream: req.stream,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::types::OpenAiMessage;

    fn msg(role: &str, content: &str) -> OpenAiMessage {
        OpenAiMessage { role: role.into(), content: content.into() }
    }

    #[test]
    fn rejects_empty_model() {
        let req = OpenAiChatRequest {
            model: "".into(),
            messages: vec![msg("user", "hi")],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: None,
            stream: false,
        };
        assert!(matches!(to_anthropic_request(&req, 4096), Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_empty_messages() {
        let req = OpenAiChatRequest {
            model: "claude-sonnet-4-5".into(),
            messages: vec![],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: None,
            stream: false,
        };
        assert!(matches!(to_anthropic_request(&req, 4096), Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn rejects_non_user_leading_message() {
        let req = OpenAiChatRequest {
            model: "claude-sonnet-4-5".into(),
            messages: vec![msg("assistant", "hi")],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: None,
            stream: false,
        };
        assert!(matches!(to_anthropic_request(&req, 4096), Err(GatewayError::InvalidRequest(_))));
    }

    #[test]
    fn folds_leading_system_message() {
        let req = OpenAiChatRequest {
            model: "claude-sonnet-4-5".into(),
            messages: vec![msg("system", "be brief"), msg("user", "ping")],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: None,
            stream: false,
        };
        let out = to_anthropic_request(&req, 4096).unwrap();
        assert_eq!(out.system.as_deref(), Some("be brief"));
        assert_eq!(out.messages.len(), 1);
        assert_eq!(out.messages[0].role, "user");
    }

    #[test]
    fn folds_mid_sequence_system_messages_into_prefix() {
        let req = OpenAiChatRequest {
            model: "claude-sonnet-4-5".into(),
            messages: vec![
                msg("system", "rule one"),
                msg("user", "hi"),
                msg("system", "rule two"),
                msg("assistant", "hello"),
                msg("user", "how are you"),
            ],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: None,
            stream: false,
        };
        let out = to_anthropic_request(&req, 4096).unwrap();
        assert_eq!(out.system.as_deref(), Some("rule one\n\nrule two"));
        assert_eq!(out.messages.len(), 3);
    }

    #[test]
    fn max_tokens_prefers_explicit_field_then_completion_then_default() {
        let base = OpenAiChatRequest {
            model: "m".into(),
            messages: vec![msg("user", "hi")],
            temperature: None,
            top_p: None,
            max_tokens: None,
            max_completion_tokens: None,
            stream: false,
        };

        let defaulted = to_anthropic_request(&base, 4096).unwrap();
        assert_eq!(defaulted.max_tokens, 4096);

        let mut with_completion = base.clone();
        with_completion.max_completion_tokens = Some(512);
        assert_eq!(to_anthropic_request(&with_completion, 4096).unwrap().max_tokens, 512);

        let mut with_both = base;
        with_both.max_completion_tokens = Some(512);
        with_both.max_tokens = Some(128);
        assert_eq!(to_anthropic_request(&with_both, 4096).unwrap().max_tokens, 128);
    }

    #[test]
    fn temperature_and_top_p_pass_through() {
        let req = OpenAiChatRequest {
            model: "m".into(),
            messages: vec![msg("user", "hi")],
            temperature: Some(0.7),
            top_p: Some(0.9),
            max_tokens: None,
            max_completion_tokens: None,
            stream: true,
        };
        let out = to_anthropic_request(&req, 4096).unwrap();
        assert_eq!(out.temperature, Some(0.7));
        assert_eq!(out.top_p, Some(0.9));
        assert!(out.stream);
    }
}
