use std::sync::Arc;

use gateway_core::{Config, CredentialManager, PkceAuthenticator, UpstreamClient};

/// Shared, cloneable handle to everything a request handler needs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<CredentialManager>,
    pub authenticator: Arc<PkceAuthenticator>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let store = gateway_core::TokenStore::new(config.token_file.clone());
        let authenticator = Arc::new(PkceAuthenticator::new(&config));
        let credentials = Arc::new(CredentialManager::new(store, authenticator.clone()));
        let upstream = Arc::new(UpstreamClient::new(&config, credentials.clone()));

        Self { config, credentials, authenticator, upstream }
    }
}
