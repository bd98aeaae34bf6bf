//! Core, transport-agnostic logic for the Anthropic OAuth proxy.
//!
//! Everything in this crate is unit-testable without a running HTTP server:
//! credential lifecycle, protocol translation, and the streaming bridge.

pub mod config;
pub mod credential_manager;
pub mod errors;
pub mod oauth;
pub mod pkce;
pub mod security;
pub mod stream_bridge;
pub mod token_store;
pub mod translate;
pub mod upstream;

pub use config::Config;
pub use credential_manager::CredentialManager;
pub use errors::GatewayError;
pub use oauth::PkceAuthenticator;
pub use security::Credential;
pub use token_store::TokenStore;
pub use upstream::UpstreamClient;
