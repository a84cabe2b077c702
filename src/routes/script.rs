use std::collections::HashMap;

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::llm::{EnhancementStyle, LlmProvider};
use crate::services::ollama;
use crate::session::cookie::BrowserSession;
use crate::utils::limits::validate_text_length;
use crate::utils::template::{find_phonetic_directives, substitute_phonetic_directives};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/script/enhance", post(enhance))
        .route("/api/script/translate", post(translate))
        .route("/api/script/phonetics", post(phonetics))
}

fn check_input(text: &str, what: &str, max_chars: usize) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::validation(format!("{} cannot be empty", what)));
    }
    if !validate_text_length(text, max_chars) {
        return Err(AppError::validation(format!(
            "{} is {} characters, exceeding the maximum of {}",
            what,
            text.chars().count(),
            max_chars
        )));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceBody {
    script: String,
    #[serde(default)]
    guidance: String,
    #[serde(default)]
    provider: LlmProvider,
    #[serde(default)]
    model: Option<String>,
    /// Target speech model; picks the Audio Tags style for v3 models.
    #[serde(default)]
    speech_model_id: Option<String>,
}

async fn enhance(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(body): Json<EnhanceBody>,
) -> Result<Json<Value>, AppError> {
    check_input(&body.script, "Script", state.config.max_text_length)?;
    let style = EnhancementStyle::for_model(body.speech_model_id.as_deref());

    let (enhanced, model) = match body.provider {
        LlmProvider::Ollama => {
            let model = non_empty(body.model).unwrap_or_else(|| state.config.ollama_model.clone());
            let text = ollama::enhance_script(&model, &body.script, &body.guidance, style).await?;
            (text, model)
        }
        LlmProvider::OpenRouter => {
            let id = session.session_id();
            let client = state.openrouter(id)?;
            let model = non_empty(body.model)
                .or(state.sessions.settings(id).enhancement_model)
                .unwrap_or_else(|| state.config.default_enhancement_model.clone());
            let text = client
                .enhance_script(&body.script, &body.guidance, style, &model)
                .await?;
            (text, model)
        }
    };

    Ok(Json(json!({
        "script": enhanced,
        "model": model,
        "audioTags": style == EnhancementStyle::AudioTags,
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateBody {
    text: String,
    language: String,
    #[serde(default)]
    model: Option<String>,
}

async fn translate(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(body): Json<TranslateBody>,
) -> Result<Json<Value>, AppError> {
    check_input(&body.text, "Text", state.config.max_text_length)?;
    if body.language.trim().is_empty() {
        return Err(AppError::validation("Target language cannot be empty"));
    }

    let id = session.session_id();
    let client = state.openrouter(id)?;
    let model = non_empty(body.model)
        .or(state.sessions.settings(id).translation_model)
        .unwrap_or_else(|| state.config.default_translation_model.clone());
    let translated = client.translate(&body.text, body.language.trim(), &model).await?;

    Ok(Json(json!({ "text": translated, "model": model })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneticsBody {
    text: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    speech_model_id: Option<String>,
}

/// Convert every distinct `[[language:word]]` in the text, one call each.
async fn phonetics(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(body): Json<PhoneticsBody>,
) -> Result<Json<Value>, AppError> {
    check_input(&body.text, "Text", state.config.max_text_length)?;

    let mut directives = find_phonetic_directives(&body.text);
    let mut seen = std::collections::HashSet::new();
    directives.retain(|d| seen.insert(d.clone()));
    if directives.is_empty() {
        return Ok(Json(json!({ "text": body.text, "conversions": [] })));
    }

    let id = session.session_id();
    let client = state.openrouter(id)?;
    let model = non_empty(body.model)
        .or(state.sessions.settings(id).enhancement_model)
        .unwrap_or_else(|| state.config.default_enhancement_model.clone());

    let mut conversions = HashMap::new();
    let mut listed = Vec::with_capacity(directives.len());
    for directive in directives {
        let spelling = client
            .convert_word_to_phonetic(
                &directive.word,
                &directive.language,
                &model,
                body.speech_model_id.as_deref(),
            )
            .await?;
        listed.push(json!({
            "language": directive.language,
            "word": directive.word,
            "spelling": spelling,
        }));
        conversions.insert(directive, spelling);
    }

    Ok(Json(json!({
        "text": substitute_phonetic_directives(&body.text, &conversions),
        "conversions": listed,
    })))
}
