//! Credential type and the fixed OAuth configuration for the consumer
//! client registered to the Claude Code application.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// The access/refresh token pair plus expiry, as persisted by [`crate::token_store::TokenStore`].
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Credential {
    pub fn is_expired(&self, now_unix: i64) -> bool {
        now_unix >= self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.refresh_token.expose_secret() == other.refresh_token.expose_secret()
            && self.expires_at == other.expires_at
    }
}

/// Fixed OAuth parameters for the Claude Code consumer client. These are
/// public client-identification values, not secrets.
pub struct AnthropicOAuthConfig {
    pub auth_url: &'static str,
    pub token_url: &'static str,
    pub redirect_uri: &'static str,
    pub client_id: &'static str,
    pub scopes: &'static [&'static str],
}

pub const ANTHROPIC_OAUTH: AnthropicOAuthConfig = AnthropicOAuthConfig {
    auth_url: "https://claude.ai/oauth/authorize",
    token_url: "https://console.anthropic.com/v1/oauth/token",
    redirect_uri: "https://console.anthropic.com/oauth/code/callback",
    client_id: "9d1c250a-e61b-44d9-88ed-5944d1962f5e",
    scopes: &["org:create_api_key", "user:profile", "user:inference"],
};
