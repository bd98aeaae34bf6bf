use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn list_models(State(state): State<AppState>) -> Json<serde_json::Value> {
    let known = [
        state.config.default_model.as_str(),
        "claude-opus-4-5",
        "claude-haiku-4-5",
    ];

    let mut seen = std::collections::HashSet::new();
    let data: Vec<_> = known
        .into_iter()
        .filter(|id| seen.insert(*id))
        .map(|id| {
            serde_json::json!({
                "id": id,
                "object": "model",
                "owned_by": "anthropic",
            })
        })
        .collect();

    Json(serde_json::json!({"object": "list", "data": data}))
}
