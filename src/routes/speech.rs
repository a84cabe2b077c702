use std::collections::HashMap;

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::elevenlabs::{SpeechRequest, SpeechSynthesizer, VoiceSettings};
use crate::services::outputs::single_file_name;
use crate::session::cookie::BrowserSession;
use crate::utils::limits::validate_text_length;
use crate::utils::template::{
    normalize_literal_newlines, substitute_phonetic_directives, substitute_variables,
    unique_variables, PhoneticDirective,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/speech", post(generate_speech))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhoneticConversion {
    language: String,
    word: String,
    spelling: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeechBody {
    text: String,
    voice_id: String,
    /// Display name used in the generated file name.
    #[serde(default)]
    voice_name: Option<String>,
    model_id: String,
    #[serde(default)]
    voice_settings: VoiceSettings,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    variables: HashMap<String, String>,
    #[serde(default)]
    phonetics: Vec<PhoneticConversion>,
}

/// Resolve variables and phonetic directives, then check what is left.
fn prepare_text(body: &SpeechBody, max_chars: usize) -> Result<String, AppError> {
    let text = normalize_literal_newlines(&body.text);

    let missing: Vec<String> = unique_variables(&text)
        .into_iter()
        .filter(|v| !body.variables.contains_key(v))
        .collect();
    if !missing.is_empty() {
        return Err(AppError::validation_with(
            format!("Missing values for variables: {}", missing.join(", ")),
            "Fill in every {variable} before generating.",
        ));
    }
    let text = substitute_variables(&text, &body.variables);

    let conversions: HashMap<PhoneticDirective, String> = body
        .phonetics
        .iter()
        .map(|p| (PhoneticDirective::new(&p.language, &p.word), p.spelling.clone()))
        .collect();
    let text = substitute_phonetic_directives(&text, &conversions);

    if !validate_text_length(&text, max_chars) {
        return Err(AppError::validation(format!(
            "Text is {} characters, exceeding the maximum of {}",
            text.chars().count(),
            max_chars
        )));
    }
    Ok(text)
}

async fn generate_speech(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    Json(body): Json<SpeechBody>,
) -> Result<Json<Value>, AppError> {
    let text = prepare_text(&body, state.config.max_text_length)?;
    let request = SpeechRequest {
        voice_id: body.voice_id.clone(),
        model_id: body.model_id.clone(),
        text,
        voice_settings: body.voice_settings,
        seed: body.seed,
        language_code: body.language_code.clone(),
    };
    request.validate()?;

    let client = state.elevenlabs(session.session_id())?;
    let speech = client.synthesize(&request).await?;

    let language = body.language_code.as_deref().unwrap_or("default");
    let voice = body.voice_name.as_deref().unwrap_or(&body.voice_id);
    let file_name = single_file_name(
        language,
        voice,
        chrono::Utc::now(),
        state.config.max_filename_length,
    );
    let dir = session.single_dir().await?;
    session.write_artifact(&dir, &file_name, &speech.audio).await?;

    Ok(Json(json!({
        "fileName": file_name,
        "url": format!("/api/files/single/{}", file_name),
        "seed": speech.seed,
        "bytes": speech.audio.len(),
    })))
}
