//! Bulk generation from a CSV upload.
//!
//! The CSV needs a `text` column; an optional `filename` column names each
//! clip, and every other column is a substitution source for `{variables}`
//! in `text` and `filename`. The whole sheet is validated and every request
//! is built before the first call to the synthesis API, so a bad row never
//! leaves a half-written batch behind.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::Serialize;

use crate::error::AppError;
use crate::services::elevenlabs::{SpeechRequest, SpeechSynthesizer, VoiceSettings};
use crate::session::SessionContext;
use crate::utils::limits::{
    validate_column_name, validate_csv_file_size, validate_dataframe_rows, validate_text_length,
    ResourceLimits,
};
use crate::utils::sanitize::{sanitize_filename, PathComponent};
use crate::utils::template::{normalize_literal_newlines, substitute_variables, unique_variables};

pub const TEXT_COLUMN: &str = "text";
pub const FILENAME_COLUMN: &str = "filename";
const AUDIO_EXT: &str = ".mp3";
const MAX_RANDOM_SEED: u64 = 9_999_999_999;

fn megabytes(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Rejection for an upload over `max_bytes`. `size` is `None` when the
/// upload was cut off before its full length was known.
pub fn upload_too_large(size: Option<usize>, max_bytes: usize) -> AppError {
    let message = match size {
        Some(size) => format!(
            "File size ({:.2} MB) exceeds maximum allowed size ({:.2} MB)",
            megabytes(size),
            megabytes(max_bytes)
        ),
        None => format!(
            "File size exceeds maximum allowed size ({:.2} MB)",
            megabytes(max_bytes)
        ),
    };
    AppError::validation_with(message, "Please use a smaller file.")
}

#[derive(Debug, Clone)]
pub struct BulkSheet {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

/// Parse and validate an uploaded CSV against `limits`.
pub fn parse_bulk_csv(data: &[u8], limits: &ResourceLimits) -> Result<BulkSheet, AppError> {
    if !validate_csv_file_size(data.len(), limits.max_upload_bytes) {
        return Err(upload_too_large(Some(data.len()), limits.max_upload_bytes));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::validation_with("Could not read CSV header", e.to_string()))?
        .iter()
        .map(String::from)
        .collect();

    let invalid: Vec<&str> = columns
        .iter()
        .map(String::as_str)
        .filter(|c| !validate_column_name(c))
        .collect();
    if !invalid.is_empty() {
        return Err(AppError::validation_with(
            format!("Invalid column names detected: {}", invalid.join(", ")),
            "Column names must contain only alphanumeric characters and underscores.",
        ));
    }
    if !columns.iter().any(|c| c == TEXT_COLUMN) {
        return Err(AppError::validation_with(
            "CSV file must contain a 'text' column",
            "Please ensure your CSV file has a column named 'text'.",
        ));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::validation_with(format!("Could not parse CSV row {}", index + 1), e.to_string())
        })?;
        let row = columns
            .iter()
            .cloned()
            .zip(record.iter().map(String::from))
            .collect();
        rows.push(row);
    }

    if !validate_dataframe_rows(rows.len(), limits.max_rows) {
        return Err(AppError::validation_with(
            format!(
                "CSV file contains {} rows, which exceeds the maximum allowed ({} rows)",
                rows.len(),
                limits.max_rows
            ),
            "Please split your file into smaller batches.",
        ));
    }
    if rows.is_empty() {
        return Err(AppError::validation("CSV file contains no rows"));
    }

    Ok(BulkSheet { columns, rows })
}

/// One row, ready to synthesize.
#[derive(Debug, Clone)]
pub struct PlannedClip {
    /// Zero-based data row index.
    pub row: usize,
    pub file_name: PathComponent,
    pub text: String,
}

fn strip_audio_ext(stem: &str) -> &str {
    let len = stem.len();
    if len > AUDIO_EXT.len() && stem.is_char_boundary(len - AUDIO_EXT.len()) {
        let (head, tail) = stem.split_at(len - AUDIO_EXT.len());
        if tail.eq_ignore_ascii_case(AUDIO_EXT) {
            return head;
        }
    }
    stem
}

/// Sanitized `<stem>.mp3`, made unique within the batch with `_2`, `_3`, ...
fn unique_file_name(
    stem: &str,
    used: &mut HashSet<String>,
    max_length: usize,
) -> Result<PathComponent, AppError> {
    let first = sanitize_filename(&format!("{}{}", strip_audio_ext(stem), AUDIO_EXT), max_length);
    if used.insert(first.clone()) {
        return Ok(PathComponent::filename(&first, max_length));
    }

    let base = strip_audio_ext(&first).to_string();
    for n in 2..=used.len() + 1 {
        let suffix = format!("_{}{}", n, AUDIO_EXT);
        let budget = max_length.saturating_sub(suffix.chars().count());
        let head: String = base.chars().take(budget).collect();
        let candidate = sanitize_filename(&format!("{}{}", head, suffix), max_length);
        if used.insert(candidate.clone()) {
            return Ok(PathComponent::filename(&candidate, max_length));
        }
    }
    Err(AppError::validation(format!(
        "Could not derive a unique filename for '{}'",
        stem
    )))
}

/// Resolve text and filename for every row.
///
/// Each distinct `{variable}` takes its value from the column of the same
/// name; a variable with no matching column is a validation error.
pub fn plan_clips(sheet: &BulkSheet, limits: &ResourceLimits) -> Result<Vec<PlannedClip>, AppError> {
    let mut used = HashSet::new();
    let mut clips = Vec::with_capacity(sheet.rows.len());

    for (row, values) in sheet.rows.iter().enumerate() {
        let line = row + 1;
        let raw_text = values.get(TEXT_COLUMN).map(String::as_str).unwrap_or("");
        let template = normalize_literal_newlines(raw_text);
        let name_template = values
            .get(FILENAME_COLUMN)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty());

        let mut referenced = unique_variables(&template);
        if let Some(name) = name_template {
            referenced.extend(unique_variables(name));
        }
        if let Some(missing) = referenced.iter().find(|v| !sheet.columns.contains(*v)) {
            return Err(AppError::validation_with(
                format!("Row {} references {{{}}} but the CSV has no '{}' column", line, missing, missing),
                "Add a column with that name or remove the placeholder.",
            ));
        }

        let text = substitute_variables(&template, values);
        if text.trim().is_empty() {
            return Err(AppError::validation(format!("Row {} has empty text", line)));
        }
        if !validate_text_length(&text, limits.max_text_chars) {
            return Err(AppError::validation(format!(
                "Row {} text is {} characters, exceeding the maximum of {}",
                line,
                text.chars().count(),
                limits.max_text_chars
            )));
        }

        let stem = match name_template {
            Some(name) => substitute_variables(name, values),
            None => format!("audio_{}", row),
        };
        let file_name = unique_file_name(&stem, &mut used, limits.max_filename_chars)?;

        clips.push(PlannedClip { row, file_name, text });
    }

    Ok(clips)
}

/// Synthesis settings shared by every row of a batch.
#[derive(Debug, Clone)]
pub struct BulkJob {
    /// Sanitized name of the batch directory (the CSV file stem).
    pub name: PathComponent,
    pub voice_id: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
    /// `Some` uses the same seed for every row; `None` draws one per row.
    pub seed: Option<u64>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedClip {
    pub row: usize,
    pub file_name: String,
    pub seed: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub group: String,
    pub files: Vec<GeneratedClip>,
}

fn for_row(row: usize, err: AppError) -> AppError {
    match err {
        AppError::Api { message, details } => AppError::Api {
            message: format!("Failed to generate audio for row {}: {}", row + 1, message),
            details,
        },
        AppError::Validation { message, details } => AppError::Validation {
            message: format!("Row {}: {}", row + 1, message),
            details,
        },
        other => other,
    }
}

/// Synthesize every planned clip into the session's bulk directory for `job`.
///
/// Rows run one after another. The first failure stops the batch; clips
/// already written stay on disk.
pub async fn run_bulk_generation<S: SpeechSynthesizer>(
    synthesizer: &S,
    session: &mut SessionContext,
    job: &BulkJob,
    clips: Vec<PlannedClip>,
) -> Result<BulkReport, AppError> {
    let requests: Vec<(PlannedClip, SpeechRequest)> = {
        let mut rng = rand::thread_rng();
        clips
            .into_iter()
            .map(|clip| {
                let request = SpeechRequest {
                    voice_id: job.voice_id.clone(),
                    model_id: job.model_id.clone(),
                    text: clip.text.clone(),
                    voice_settings: job.voice_settings,
                    seed: Some(job.seed.unwrap_or_else(|| rng.gen_range(0..=MAX_RANDOM_SEED))),
                    language_code: job.language_code.clone(),
                };
                (clip, request)
            })
            .collect()
    };
    for (clip, request) in &requests {
        request.validate().map_err(|e| for_row(clip.row, e))?;
    }

    let dir = session.bulk_dir(&job.name).await?;
    tracing::info!(
        "Bulk generation '{}': {} clips into {}",
        job.name,
        requests.len(),
        dir.display()
    );

    let mut files = Vec::with_capacity(requests.len());
    for (clip, request) in requests {
        let speech = synthesizer
            .synthesize(&request)
            .await
            .map_err(|e| for_row(clip.row, e))?;
        session
            .write_artifact(&dir, &clip.file_name, &speech.audio)
            .await?;
        files.push(GeneratedClip {
            row: clip.row,
            file_name: clip.file_name.to_string(),
            seed: speech.seed.or_else(|| request.seed.map(|s| s.to_string())),
        });
    }

    Ok(BulkReport {
        group: job.name.to_string(),
        files,
    })
}
