//! HTTP client for Anthropic's Messages API: header construction, the
//! one-shot 401-refresh-retry policy, and SSE byte-stream delivery.

use std::sync::Arc;
use std::time::Duration;

use futures::Stream;
use secrecy::ExposeSecret;

use crate::config::Config;
use crate::credential_manager::CredentialManager;
use crate::errors::GatewayError;
use crate::translate::types::{AnthropicRequest, AnthropicResponse};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

pub struct UpstreamClient {
    client: reqwest::Client,
    credentials: Arc<CredentialManager>,
    messages_url: String,
    anthropic_version: String,
    anthropic_beta: String,
}

impl UpstreamClient {
    pub fn new(config: &Config, credentials: Arc<CredentialManager>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("reqwest client build");

        Self {
            client,
            credentials,
            messages_url: format!("{}/v1/messages", config.api_base.trim_end_matches('/')),
            anthropic_version: config.anthropic_version.clone(),
            anthropic_beta: config.anthropic_beta.clone(),
        }
    }

    async fn build_request(
        &self,
        req: &AnthropicRequest,
    ) -> Result<reqwest::RequestBuilder, GatewayError> {
        let token = self.credentials.current().await?;
        Ok(self
            .client
            .post(&self.messages_url)
            .header("Authorization", format!("Bearer {}", token.expose_secret()))
            .header("anthropic-version", &self.anthropic_version)
            .header("anthropic-beta", &self.anthropic_beta)
            .header("anthropic-dangerous-direct-browser-access", "true")
            .header("Content-Type", "application/json")
            .json(req))
    }

    /// Non-streaming call. Retries exactly once, after an explicit
    /// credential invalidation, on a 401.
    pub async fn send_nonstream(
        &self,
        req: &AnthropicRequest,
    ) -> Result<AnthropicResponse, GatewayError> {
        let resp = self.send_with_retry(req).await?;
        resp.json::<AnthropicResponse>()
            .await
            .map_err(|e| GatewayError::UpstreamUnreachable(e.to_string()))
    }

    /// Streaming call. Returns the raw upstream byte stream (SSE wire
    /// format, undecoded) for [`crate::stream_bridge::StreamBridge`] to
    /// consume.
    pub async fn send_stream(
        &self,
        req: &AnthropicRequest,
    ) -> Result<impl Stream<Item = reqwest::Result<bytes::Bytes>>, GatewayError> {
        let resp = self.send_with_retry(req).await?;
        Ok(resp.bytes_stream())
    }

    async fn send_with_retry(&self, req: &AnthropicRequest) -> Result<reqwest::Response, GatewayError> {
        let builder = self.build_request(req).await?;
        let resp = builder
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnreachable(e.to_string()))?;

        if resp.status().as_u16() != 401 {
            return self.check_status(resp).await;
        }

        tracing::warn!("upstream returned 401, invalidating credential and retrying once");
        self.credentials.invalidate().await;
        let retry_builder = self.build_request(req).await?;
        let retry_resp = retry_builder
            .send()
            .await
            .map_err(|e| GatewayError::UpstreamUnreachable(e.to_string()))?;
        self.check_status(retry_resp).await
    }

    async fn check_status(&self, resp: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = resp.status().as_u16();
        if (200..300).contains(&status) {
            return Ok(resp);
        }
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.text().await.unwrap_or_default();
        Err(GatewayError::from_upstream_status(status, body, retry_after))
    }
}
