use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::session::cookie::BrowserSession;
use crate::session::SessionSettings;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/settings", get(get_settings).put(update_settings))
}

/// Keys are never echoed back, only whether one is usable and where from.
fn describe(state: &AppState, settings: &SessionSettings) -> Value {
    let key_source = |session_key: Option<&str>, configured: &str| {
        match (session_key, configured.trim().is_empty()) {
            (Some(_), _) => "session",
            (None, false) => "server",
            (None, true) => "missing",
        }
    };

    json!({
        "elevenlabsApiKey": key_source(
            settings.elevenlabs_api_key.as_deref(),
            &state.config.elevenlabs_api_key,
        ),
        "openrouterApiKey": key_source(
            settings.openrouter_api_key.as_deref(),
            &state.config.openrouter_api_key,
        ),
        "enhancementModel": settings
            .enhancement_model
            .as_deref()
            .unwrap_or(&state.config.default_enhancement_model),
        "translationModel": settings
            .translation_model
            .as_deref()
            .unwrap_or(&state.config.default_translation_model),
        "ollamaModel": state.config.ollama_model,
    })
}

async fn get_settings(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
) -> Json<Value> {
    let settings = state.sessions.settings(session.session_id());
    Json(describe(&state, &settings))
}

async fn update_settings(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(update): Json<SessionSettings>,
) -> Json<Value> {
    let id = session.session_id();
    let settings = state.sessions.update(id, update);
    tracing::info!("Updated settings for session {}", id);
    Json(describe(&state, &settings))
}
