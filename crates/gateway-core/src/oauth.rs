//! PKCE login flow: authorize-URL construction, code exchange, and refresh.

use chrono::Utc;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::Config;
use crate::errors::GatewayError;
use crate::pkce::{self, PkcePair};
use crate::security::Credential;

/// A single pending login attempt. Starting a new login supersedes any
/// prior one — there is only ever one slot.
pub struct PkceAuthenticator {
    client: reqwest::Client,
    auth_base: String,
    token_url: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    pending: Mutex<Option<PkcePair>>,
}

impl PkceAuthenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            auth_base: config.auth_base.clone(),
            token_url: format!("{}/v1/oauth/token", config.auth_base.trim_end_matches('/')),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            pending: Mutex::new(None),
        }
    }

    /// Start a new login: generates fresh PKCE material, replacing any
    /// previously pending session, and returns the authorize URL.
    pub fn begin_login(&self) -> String {
        let pair = pkce::generate_pkce();
        let url = self.build_auth_url(&pair);
        *self.pending.lock() = Some(pair);
        url
    }

    fn build_auth_url(&self, pair: &PkcePair) -> String {
        use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
        let encode = |s: &str| utf8_percent_encode(s, NON_ALPHANUMERIC).to_string();

        format!(
            "{}/oauth/authorize?code=true&client_id={}&redirect_uri={}&response_type=code&scope={}&code_challenge={}&code_challenge_method=S256&state={}",
            self.auth_base.trim_end_matches('/'),
            self.client_id,
            encode(&self.redirect_uri),
            encode(&self.scope),
            pair.challenge,
            pair.state,
        )
    }

    /// Exchange a pasted `code` (optionally `code#state`) for a fresh credential.
    /// Consumes the pending session; subsequent calls without a new `begin_login`
    /// fail with `InvalidRequest`.
    pub async fn exchange(&self, pasted_code: &str) -> Result<Credential, GatewayError> {
        let pair = self
            .pending
            .lock()
            .take()
            .ok_or_else(|| GatewayError::InvalidRequest("no login in progress".into()))?;

        let (code, state) = pkce::split_pasted_code(pasted_code);
        if let Some(state) = state {
            if state != pair.state {
                return Err(GatewayError::InvalidRequest("state mismatch".into()));
            }
        }

        let resp = self
            .client
            .post(&self.token_url)
            .json(&serde_json::json!({
                "grant_type": "authorization_code",
                "client_id": self.client_id,
                "code": code,
                "redirect_uri": self.redirect_uri,
                "code_verifier": pair.verifier,
            }))
            .send()
            .await
            .map_err(|e| GatewayError::AuthCodeRejected(e.to_string()))?;

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::AuthCodeRejected(body));
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|e| GatewayError::AuthCodeRejected(e.to_string()))?;

        tracing::info!("authorization code exchanged for a credential");
        Ok(token_response_to_credential(body))
    }

    /// Refresh an access token using a refresh token.
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<Credential, GatewayError> {
        let resp = self
            .client
            .post(&self.token_url)
            .json(&serde_json::json!({
                "grant_type": "refresh_token",
                "refresh_token": refresh_token.expose_secret(),
                "client_id": self.client_id,
            }))
            .send()
            .await
            .map_err(|_| GatewayError::NeedsLogin)?;

        if !resp.status().is_success() {
            return Err(GatewayError::NeedsLogin);
        }

        let body: TokenResponse = resp
            .json()
            .await
            .map_err(|_| GatewayError::NeedsLogin)?;

        let mut credential = token_response_to_credential(body);
        if credential.refresh_token.expose_secret().is_empty() {
            credential.refresh_token = refresh_token.clone();
        }
        Ok(credential)
    }
}

fn token_response_to_credential(body: TokenResponse) -> Credential {
    const EXPIRY_SKEW_SECONDS: i64 = 30;
    let expires_at = Utc::now().timestamp() + body.expires_in as i64 - EXPIRY_SKEW_SECONDS;
    Credential {
        access_token: SecretString::from(body.access_token),
        refresh_token: SecretString::from(body.refresh_token.unwrap_or_default()),
        expires_at,
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
}
