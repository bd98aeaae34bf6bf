//! Layered configuration: environment overrides a config file, which
//! overrides built-in defaults. Every field has a default so a bare
//! invocation with zero configuration is a valid deployment.

use std::path::Path;

use serde::Deserialize;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub anthropic_version: String,
    pub anthropic_beta: String,
    pub api_base: String,
    pub auth_base: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub token_file: String,
    pub default_model: String,
    pub default_max_tokens: u32,
}

impl Config {
    pub fn defaults() -> Self {
        Self {
            port: 8081,
            log_level: "info".into(),
            anthropic_version: "2023-06-01".into(),
            anthropic_beta: "oauth-2025-04-20".into(),
            api_base: "https://api.anthropic.com".into(),
            auth_base: "https://claude.ai".into(),
            client_id: crate::security::ANTHROPIC_OAUTH.client_id.to_string(),
            redirect_uri: crate::security::ANTHROPIC_OAUTH.redirect_uri.to_string(),
            scope: crate::security::ANTHROPIC_OAUTH.scopes.join(" "),
            token_file: "~/.anthropic-oauth-proxy/tokens.json".into(),
            default_model: "claude-sonnet-4-5".into(),
            default_max_tokens: 4096,
        }
    }

    /// Load defaults, layer an optional TOML file over them, then layer
    /// environment variables over that. `file_path` is not required to exist.
    pub fn load(file_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();

        if let Some(path) = file_path {
            if let Ok(raw) = std::fs::read_to_string(path) {
                let file: FileConfig =
                    toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
                file.apply_onto(&mut config);
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_u16("PORT") {
            self.port = v;
        }
        if let Some(v) = env_string("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = env_string("ANTHROPIC_VERSION") {
            self.anthropic_version = v;
        }
        if let Some(v) = env_string("ANTHROPIC_BETA") {
            self.anthropic_beta = v;
        }
        if let Some(v) = env_string("API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = env_string("AUTH_BASE") {
            self.auth_base = v;
        }
        if let Some(v) = env_string("CLIENT_ID") {
            self.client_id = v;
        }
        if let Some(v) = env_string("REDIRECT_URI") {
            self.redirect_uri = v;
        }
        if let Some(v) = env_string("SCOPE") {
            self.scope = v;
        }
        if let Some(v) = env_string("TOKEN_FILE") {
            self.token_file = v;
        }
        if let Some(v) = env_string("DEFAULT_MODEL") {
            self.default_model = v;
        }
        if let Some(v) = env_u32("DEFAULT_MAX_TOKENS") {
            self.default_max_tokens = v;
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u16(key: &str) -> Option<u16> {
    env_string(key).and_then(|v| v.parse().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_string(key).and_then(|v| v.parse().ok())
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    port: Option<u16>,
    log_level: Option<String>,
    anthropic_version: Option<String>,
    anthropic_beta: Option<String>,
    api_base: Option<String>,
    auth_base: Option<String>,
    client_id: Option<String>,
    redirect_uri: Option<String>,
    scope: Option<String>,
    token_file: Option<String>,
    default_model: Option<String>,
    default_max_tokens: Option<u32>,
}

impl FileConfig {
    fn apply_onto(self, config: &mut Config) {
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }
        if let Some(v) = self.anthropic_version {
            config.anthropic_version = v;
        }
        if let Some(v) = self.anthropic_beta {
            config.anthropic_beta = v;
        }
        if let Some(v) = self.api_base {
            config.api_base = v;
        }
        if let Some(v) = self.auth_base {
            config.auth_base = v;
        }
        if let Some(v) = self.client_id {
            config.client_id = v;
        }
        if let Some(v) = self.redirect_uri {
            config.redirect_uri = v;
        }
        if let Some(v) = self.scope {
            config.scope = v;
        }
        if let Some(v) = self.token_file {
            config.token_file = v;
        }
        if let Some(v) = self.default_model {
            config.default_model = v;
        }
        if let Some(v) = self.default_max_tokens {
            config.default_max_tokens = v;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}
