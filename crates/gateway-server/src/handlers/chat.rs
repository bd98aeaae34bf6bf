use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use gateway_core::stream_bridge::StreamBridge;
use gateway_core::translate::{from_anthropic_response, to_anthropic_request, OpenAiChatRequest};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn chat_completions(
    State(state): State<AppState>,
    Json(req): Json<OpenAiChatRequest>,
) -> Result<Response, ApiError> {
    let anthropic_req = to_anthropic_request(&req, state.config.default_max_tokens)?;

    if anthropic_req.stream {
        Ok(stream_response(state, anthropic_req, req.model).await?)
    } else {
        let resp = state.upstream.send_nonstream(&anthropic_req).await?;
        let created = chrono::Utc::now().timestamp();
        let completion = from_anthropic_response(&resp, &req.model, created);
        Ok(Json(completion).into_response())
    }
}

async fn stream_response(
    state: AppState,
    anthropic_req: gateway_core::translate::AnthropicRequest,
    model: String,
) -> Result<Response, ApiError> {
    let byte_stream = state.upstream.send_stream(&anthropic_req).await?;
    let created = chrono::Utc::now().timestamp();

    let sse_body = async_stream::stream! {
        let mut bridge = StreamBridge::new(model, created);
        let mut byte_stream = Box::pin(byte_stream);

        while let Some(next) = byte_stream.next().await {
            match next {
                Ok(bytes) => {
                    let text = String::from_utf8_lossy(&bytes).into_owned();
                    for line in bridge.feed(&text) {
                        yield Ok::<_, std::io::Error>(bytes::Bytes::from(line));
                    }
                }
                Err(e) => {
                    for line in bridge.error_chunk(e.to_string()) {
                        yield Ok(bytes::Bytes::from(line));
                    }
                    break;
                }
            }
        }
        for line in bridge.finish() {
            yield Ok(bytes::Bytes::from(line));
        }
    };

    let response = Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_body))
        .expect("static headers and a streaming body always build");

    Ok(response)
}
