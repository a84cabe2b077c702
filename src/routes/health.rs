use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let outputs_status = match tokio::fs::metadata(state.outputs.path()).await {
        Ok(meta) if meta.is_dir() => "ok",
        _ => "error",
    };

    let code = if outputs_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(json!({
            "status": if outputs_status == "ok" { "ok" } else { "degraded" },
            "outputs": outputs_status,
            "elevenlabs": !state.config.elevenlabs_api_key.is_empty(),
            "openrouter": !state.config.openrouter_api_key.is_empty(),
            "sessions": state.sessions.len(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
