use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::services::bulk::{
    parse_bulk_csv, plan_clips, run_bulk_generation, upload_too_large, BulkJob,
};
use crate::services::elevenlabs::VoiceSettings;
use crate::session::cookie::BrowserSession;
use crate::utils::sanitize::PathComponent;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/bulk", post(bulk_generate))
}

/// Form fields of a bulk upload, before validation.
#[derive(Default)]
struct BulkForm {
    csv: Option<(String, Vec<u8>)>,
    voice_id: String,
    model_id: String,
    voice_settings: Option<String>,
    seed: Option<String>,
    language_code: Option<String>,
}

fn upload_error(e: MultipartError, message: &str, max_bytes: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        upload_too_large(None, max_bytes)
    } else {
        AppError::validation_with(message, e.to_string())
    }
}

/// Read the form. The CSV is streamed in chunks and refused as soon as it
/// passes `max_bytes`.
async fn read_form(mut multipart: Multipart, max_bytes: usize) -> Result<BulkForm, AppError> {
    let mut form = BulkForm::default();
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Malformed upload", max_bytes))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or("bulk.csv").to_string();
            let mut data = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|e| upload_error(e, "Could not read uploaded file", max_bytes))?
            {
                data.extend_from_slice(&chunk);
                if data.len() > max_bytes {
                    return Err(upload_too_large(None, max_bytes));
                }
            }
            form.csv = Some((file_name, data));
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| upload_error(e, "Malformed upload", max_bytes))?;
        let value = value.trim().to_string();
        match name.as_str() {
            "voiceId" => form.voice_id = value,
            "modelId" => form.model_id = value,
            "voiceSettings" if !value.is_empty() => form.voice_settings = Some(value),
            "seed" if !value.is_empty() => form.seed = Some(value),
            "languageCode" if !value.is_empty() => form.language_code = Some(value),
            _ => {}
        }
    }
    Ok(form)
}

/// Batch directory name: the upload's file stem.
fn batch_name(file_name: &str, max_length: usize) -> PathComponent {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    PathComponent::sanitize(stem, max_length)
}

async fn bulk_generate(
    State(state): State<AppState>,
    BrowserSession(mut session): BrowserSession,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let limits = state.config.limits();
    let form = read_form(multipart, limits.max_upload_bytes).await?;
    let (file_name, data) = form
        .csv
        .ok_or_else(|| AppError::validation("A CSV file is required"))?;

    let voice_settings: VoiceSettings = match form.voice_settings.as_deref() {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| AppError::validation_with("Invalid voice settings", e.to_string()))?,
        None => VoiceSettings::default(),
    };
    let seed = form
        .seed
        .map(|s| s.parse::<u64>())
        .transpose()
        .map_err(|_| AppError::validation("Seed must be a non-negative integer"))?;

    let sheet = parse_bulk_csv(&data, &limits)?;
    let clips = plan_clips(&sheet, &limits)?;

    let job = BulkJob {
        name: batch_name(&file_name, limits.max_filename_chars),
        voice_id: form.voice_id,
        model_id: form.model_id,
        voice_settings,
        seed,
        language_code: form.language_code,
    };
    let client = state.elevenlabs(session.session_id())?;
    tracing::info!(
        "Session {} starting bulk '{}' ({} rows)",
        session.session_id(),
        job.name,
        clips.len()
    );

    let report = run_bulk_generation(&client, &mut session, &job, clips).await?;
    Ok(Json(json!({
        "group": report.group,
        "count": report.files.len(),
        "files": report.files,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_name_uses_sanitized_stem() {
        assert_eq!(batch_name("greetings.csv", 100).as_str(), "greetings");
        assert_eq!(batch_name("../../evil.csv", 100).as_str(), "evil");
        assert_eq!(batch_name("", 100).as_str(), "default");
    }
}
