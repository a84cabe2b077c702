use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::model_capabilities::model_capabilities;
use crate::services::openrouter::{filter_free_models, search_models};
use crate::session::cookie::BrowserSession;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/voices", get(list_voices))
        .route("/api/models", get(list_models))
        .route("/api/llm-models", get(list_llm_models))
        .route("/api/voice-design/previews", post(create_previews))
        .route("/api/voice-design/voices", post(create_voice))
}

async fn list_voices(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
) -> Result<Json<Value>, AppError> {
    let client = state.elevenlabs(session.session_id())?;
    let voices = client.fetch_voices().await?;
    Ok(Json(json!({ "voices": voices })))
}

/// Speech models, each annotated with the settings it accepts.
async fn list_models(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
) -> Result<Json<Value>, AppError> {
    let client = state.elevenlabs(session.session_id())?;
    let models: Vec<Value> = client
        .fetch_models()
        .await?
        .into_iter()
        .map(|m| {
            json!({
                "modelId": m.model_id,
                "name": m.name,
                "capabilities": model_capabilities(&m.model_id),
            })
        })
        .collect();
    Ok(Json(json!({ "models": models })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmModelQuery {
    #[serde(default)]
    free_only: bool,
    #[serde(default)]
    search: Option<String>,
}

async fn list_llm_models(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Query(query): Query<LlmModelQuery>,
) -> Result<Json<Value>, AppError> {
    let client = state.openrouter(session.session_id())?;
    let models = filter_free_models(client.fetch_models().await?, query.free_only);
    let models = match query.search.as_deref() {
        Some(q) => search_models(models, q),
        None => models,
    };
    let count = models.len();
    Ok(Json(json!({ "models": models, "count": count })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewBody {
    voice_description: String,
}

async fn create_previews(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(body): Json<PreviewBody>,
) -> Result<Json<Value>, AppError> {
    if body.voice_description.trim().is_empty() {
        return Err(AppError::validation("Voice description cannot be empty"));
    }
    let client = state.elevenlabs(session.session_id())?;
    let previews = client.create_voice_previews(body.voice_description.trim()).await?;
    tracing::info!("Generated {} voice previews", previews.len());
    Ok(Json(json!({ "previews": previews })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateVoiceBody {
    voice_name: String,
    voice_description: String,
    generated_voice_id: String,
    #[serde(default)]
    played_voice_ids: Vec<String>,
}

async fn create_voice(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(body): Json<CreateVoiceBody>,
) -> Result<Json<Value>, AppError> {
    if body.voice_name.trim().is_empty() {
        return Err(AppError::validation("Voice name cannot be empty"));
    }
    let client = state.elevenlabs(session.session_id())?;
    let played: Vec<String> = body
        .played_voice_ids
        .into_iter()
        .filter(|id| *id != body.generated_voice_id)
        .collect();
    let voice = client
        .create_voice_from_preview(
            body.voice_name.trim(),
            body.voice_description.trim(),
            body.generated_voice_id.trim(),
            &played,
        )
        .await?;

    let name = voice.name.clone().unwrap_or_else(|| body.voice_name.trim().to_string());
    Ok(Json(created_voice(&voice.voice_id, &name)))
}

/// Names go back verbatim; the page escapes them where it renders.
fn created_voice(voice_id: &str, name: &str) -> Value {
    json!({
        "voiceId": voice_id,
        "name": name,
        "message": format!("Voice '{}' created", name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_voice_name_is_not_escaped() {
        let body = created_voice("abc123", "Tom & Jerry's");
        assert_eq!(body["name"], "Tom & Jerry's");
        assert_eq!(body["message"], "Voice 'Tom & Jerry's' created");
    }
}
