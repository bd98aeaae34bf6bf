use axum::routing::{get, post};
use axum::Router;
use gateway_core::Config;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, chat, health, models};
use crate::state::AppState;

/// Construct the router. Request/response tracing is attached here so
/// every route gets it uniformly; handlers never log method/path/status
/// themselves.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::health))
        .route("/auth/login", get(auth::login))
        .route("/auth/exchange", post(auth::exchange))
        .route("/auth/status", get(auth::status))
        .route("/v1/chat/completions", post(chat::chat_completions))
        .route("/v1/models", get(models::list_models))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the loopback listener and serve until `ctrl_c`.
pub async fn start(config: Config) -> anyhow::Result<()> {
    let port = config.port;
    let state = AppState::new(config);
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "anthropic-oauth-proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
