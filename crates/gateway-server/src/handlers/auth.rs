use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Starts a login attempt and presents the authorize URL plus a pasteable
/// form, for headless environments where the browser can't be opened for
/// the caller automatically.
pub async fn login(State(state): State<AppState>) -> impl IntoResponse {
    let url = state.authenticator.begin_login();
    Html(format!(
        r#"<!doctype html>
<html>
<head><title>Anthropic OAuth Proxy — Login</title></head>
<body>
<p>Open this URL, approve access, then paste the resulting code below:</p>
<p><a href="{url}">{url}</a></p>
<form method="post" action="/auth/exchange" onsubmit="return submitCode(event)">
  <input type="text" id="code" name="code" placeholder="code#state" size="60">
  <button type="submit">Submit</button>
</form>
<script>
function submitCode(e) {{
  e.preventDefault();
  fetch('/auth/exchange', {{
    method: 'POST',
    headers: {{'Content-Type': 'application/json'}},
    body: JSON.stringify({{code: document.getElementById('code').value}}),
  }}).then(r => r.text()).then(t => document.body.insertAdjacentHTML('beforeend', '<pre>' + t + '</pre>'));
  return false;
}}
</script>
</body>
</html>"#
    ))
}

#[derive(Deserialize)]
pub struct ExchangeBody {
    pub code: String,
}

pub async fn exchange(
    State(state): State<AppState>,
    Json(body): Json<ExchangeBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let credential = state.authenticator.exchange(&body.code).await?;
    state.credentials.install(credential).await?;
    Ok(Json(serde_json::json!({"ok": true})))
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.credentials.status().await {
        None => Json(serde_json::json!({"present": false, "expires_at": null, "expired": true})),
        Some((expires_at, expired)) => {
            let iso = Utc
                .timestamp_opt(expires_at, 0)
                .single()
                .map(|dt| dt.to_rfc3339());
            Json(serde_json::json!({"present": true, "expires_at": iso, "expired": expired}))
        }
    }
}
