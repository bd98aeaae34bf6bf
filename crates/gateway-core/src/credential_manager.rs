//! Serves a valid bearer token to [`crate::upstream::UpstreamClient`],
//! refreshing transparently and coalescing concurrent refresh attempts
//! onto a single in-flight request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{broadcast, RwLock};

use crate::errors::GatewayError;
use crate::oauth::PkceAuthenticator;
use crate::security::Credential;
use crate::token_store::TokenStore;

/// How long a failed refresh is remembered before another attempt is made,
/// to avoid a login-storm hammering the token endpoint.
const FAST_FAIL_WINDOW: Duration = Duration::from_secs(5);

enum RefreshState {
    Idle,
    /// A refresh is in flight; late arrivals subscribe to this channel
    /// instead of starting their own request.
    InFlight(broadcast::Sender<Result<(), ()>>),
    /// A refresh failed recently enough that further callers should fail
    /// fast without retrying the network.
    RecentlyFailed(Instant),
}

pub struct CredentialManager {
    store: TokenStore,
    authenticator: Arc<PkceAuthenticator>,
    cached: RwLock<Option<Credential>>,
    refresh_state: RwLock<RefreshState>,
}

impl CredentialManager {
    pub fn new(store: TokenStore, authenticator: Arc<PkceAuthenticator>) -> Self {
        let cached = store.load().ok();
        Self {
            store,
            authenticator,
            cached: RwLock::new(cached),
            refresh_state: RwLock::new(RefreshState::Idle),
        }
    }

    /// Persist and install a freshly exchanged credential, making it the
    /// one used by subsequent `current()` calls.
    pub async fn install(&self, credential: Credential) -> Result<(), GatewayError> {
        self.store
            .save(&credential)
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
        *self.cached.write().await = Some(credential);
        Ok(())
    }

    /// Return `true` if a credential is present on disk/in memory, regardless
    /// of whether it is expired.
    pub async fn status(&self) -> Option<(i64, bool)> {
        let cached = self.cached.read().await;
        cached.as_ref().map(|c| (c.expires_at, c.is_expired(Utc::now().timestamp())))
    }

    /// Force the current access token to be treated as expired, so the next
    /// `current()` call refreshes. Called after an upstream 401.
    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        if let Some(credential) = cached.as_mut() {
            credential.expires_at = 0;
        }
    }

    /// Return a usable bearer token, refreshing first if the cached one is
    /// expired. At most one refresh is in flight at a time; concurrent
    /// callers await the same outcome.
    pub async fn current(&self) -> Result<SecretString, GatewayError> {
        let needs_refresh = {
            let cached = self.cached.read().await;
            match cached.as_ref() {
                None => true,
                Some(c) => c.is_expired(Utc::now().timestamp()),
            }
        };

        if needs_refresh {
            self.ensure_refreshed().await?;
        }

        let cached = self.cached.read().await;
        cached
            .as_ref()
            .map(|c| c.access_token.clone())
            .ok_or(GatewayError::NeedsLogin)
    }

    async fn ensure_refreshed(&self) -> Result<(), GatewayError> {
        // Fast path: subscribe to an in-flight refresh, or fail fast if one
        // recently failed, without touching the write lock.
        {
            let state = self.refresh_state.read().await;
            match &*state {
                RefreshState::InFlight(tx) => {
                    let mut rx = tx.subscribe();
                    drop(state);
                    return match rx.recv().await {
                        Ok(Ok(())) => Ok(()),
                        _ => Err(GatewayError::NeedsLogin),
                    };
                }
                RefreshState::RecentlyFailed(at) if at.elapsed() < FAST_FAIL_WINDOW => {
                    return Err(GatewayError::NeedsLogin);
                }
                _ => {}
            }
        }

        // Become the leader: acquire the write lock, re-check, and if still
        // needed, start the one refresh that everyone else will observe.
        let mut state = self.refresh_state.write().await;
        if let RefreshState::InFlight(tx) = &*state {
            let mut rx = tx.subscribe();
            drop(state);
            return match rx.recv().await {
                Ok(Ok(())) => Ok(()),
                _ => Err(GatewayError::NeedsLogin),
            };
        }
        if let RefreshState::RecentlyFailed(at) = &*state {
            if at.elapsed() < FAST_FAIL_WINDOW {
                return Err(GatewayError::NeedsLogin);
            }
        }

        let (tx, _rx) = broadcast::channel(1);
        *state = RefreshState::InFlight(tx.clone());
        drop(state);

        let result = self.do_refresh().await;
        match &result {
            Ok(()) => tracing::info!("credential refresh succeeded"),
            Err(e) => tracing::warn!(error = %e, "credential refresh failed"),
        }

        let mut state = self.refresh_state.write().await;
        *state = match &result {
            Ok(()) => RefreshState::Idle,
            Err(_) => RefreshState::RecentlyFailed(Instant::now()),
        };
        drop(state);

        let _ = tx.send(result.as_ref().map(|_| ()).map_err(|_| ()));
        result
    }

    async fn do_refresh(&self) -> Result<(), GatewayError> {
        let refresh_token = {
            let cached = self.cached.read().await;
            cached
                .as_ref()
                .map(|c| c.refresh_token.clone())
                .ok_or(GatewayError::NeedsLogin)?
        };

        if refresh_token.expose_secret().is_empty() {
            return Err(GatewayError::NeedsLogin);
        }

        let refreshed = self.authenticator.refresh(&refresh_token).await?;
        self.install(refreshed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    fn expired_credential() -> Credential {
        Credential {
            access_token: SecretString::from("stale".to_string()),
            refresh_token: SecretString::from("refresh-me".to_string()),
            expires_at: 0,
        }
    }

    fn fresh_credential() -> Credential {
        Credential {
            access_token: SecretString::from("fresh".to_string()),
            refresh_token: SecretString::from("refresh-me".to_string()),
            expires_at: i64::MAX,
        }
    }

    async fn manager_with_server(server_uri: String) -> (tempfile::TempDir, CredentialManager) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("tokens.json"));
        let config = Config { auth_base: server_uri, ..Config::defaults() };
        let auth = Arc::new(PkceAuthenticator::new(&config));
        let manager = CredentialManager::new(store, auth);
        (dir, manager)
    }

    #[tokio::test]
    async fn current_returns_cached_token_when_fresh() {
        let (_dir, manager) = manager_with_server("https://example.invalid".into()).await;
        manager.install(fresh_credential()).await.unwrap();
        let token = manager.current().await.unwrap();
        assert_eq!(token.expose_secret(), "fresh");
    }

    #[tokio::test]
    async fn current_with_no_credential_needs_login() {
        let (_dir, manager) = manager_with_server("https://example.invalid".into()).await;
        let err = manager.current().await.unwrap_err();
        assert!(matches!(err, GatewayError::NeedsLogin));
    }

    #[tokio::test]
    async fn current_refreshes_expired_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "refreshed",
                "refresh_token": "refresh-me",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let (_dir, manager) = manager_with_server(server.uri()).await;
        manager.install(expired_credential()).await.unwrap();

        let token = manager.current().await.unwrap();
        assert_eq!(token.expose_secret(), "refreshed");
    }

    #[tokio::test]
    async fn invalidate_forces_next_current_to_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "refreshed-2",
                "refresh_token": "refresh-me",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let (_dir, manager) = manager_with_server(server.uri()).await;
        manager.install(fresh_credential()).await.unwrap();
        assert_eq!(manager.current().await.unwrap().expose_secret(), "fresh");

        manager.invalidate().await;
        assert_eq!(manager.current().await.unwrap().expose_secret(), "refreshed-2");
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce_into_one_upstream_call() {
        struct CountingResponder {
            count: Arc<AtomicUsize>,
        }
        impl Respond for CountingResponder {
            fn respond(&self, _req: &Request) -> ResponseTemplate {
                self.count.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "access_token": "refreshed-concurrent",
                    "refresh_token": "refresh-me",
                    "expires_in": 3600,
                }))
            }
        }

        let server = MockServer::start().await;
        let count = Arc::new(AtomicUsize::new(0));
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(CountingResponder { count: count.clone() })
            .mount(&server)
            .await;

        let (_dir, manager) = manager_with_server(server.uri()).await;
        manager.install(expired_credential()).await.unwrap();
        let manager = Arc::new(manager);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let m = manager.clone();
            handles.push(tokio::spawn(async move { m.current().await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_failure_is_remembered_within_fast_fail_window() {
        struct CountingResponder {
            count: Arc<AtomicUsize>,
        }
        impl Respond for CountingResponder {
            fn respond(&self, _req: &Request) -> ResponseTemplate {
                self.count.fetch_add(1, Ordering::SeqCst);
                ResponseTemplate::new(400).set_body_string("invalid_grant")
            }
        }

        let server = MockServer::start().await;
        let count = Arc::new(AtomicUsize::new(0));
        Mock::given(method("POST"))
            .and(path("/v1/oauth/token"))
            .respond_with(CountingResponder { count: count.clone() })
            .mount(&server)
            .await;

        let (_dir, manager) = manager_with_server(server.uri()).await;
        manager.install(expired_credential()).await.unwrap();

        assert!(manager.current().await.is_err());
        assert!(manager.current().await.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
