//! Naming and browsing of a session's generated audio.
//!
//! Single generations are named `<LANG>_<VOICE>_<YYYYMMDD-HHMMSS>_<id>.mp3`.
//! Each field is sanitized with `_` replaced by `-`, so the name splits back
//! into exactly four fields for the file explorer.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::session::SessionContext;
use crate::utils::sanitize::{sanitize_path_component, validate_path_within_base, PathComponent};

const FIELD_MAX: usize = 32;
const AUDIO_EXT: &str = "mp3";

static SINGLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^_]+)_([^_]+)_(\d{8}-\d{6})_([^_]+)\.mp3$").expect("valid regex")
});

fn name_field(raw: &str) -> String {
    sanitize_path_component(raw, FIELD_MAX).replace('_', "-")
}

/// File name for one single generation.
pub fn single_file_name(
    language: &str,
    voice_name: &str,
    at: DateTime<Utc>,
    max_length: usize,
) -> PathComponent {
    let id = Uuid::new_v4().simple().to_string();
    let name = format!(
        "{}_{}_{}_{}.{}",
        name_field(language),
        name_field(voice_name),
        at.format("%Y%m%d-%H%M%S"),
        &id[..8],
        AUDIO_EXT
    );
    PathComponent::filename(&name, max_length)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleFileMeta {
    pub language: String,
    pub voice: String,
    pub created: String,
    pub id: String,
}

/// Recover the fields of a name built by [`single_file_name`].
pub fn parse_single_filename(name: &str) -> Option<SingleFileMeta> {
    let caps = SINGLE_NAME_RE.captures(name)?;
    Some(SingleFileMeta {
        language: caps[1].to_string(),
        voice: caps[2].to_string(),
        created: caps[3].to_string(),
        id: caps[4].to_string(),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputFile {
    pub file_name: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SingleFileMeta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkGroup {
    pub name: String,
    pub files: Vec<OutputFile>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputListing {
    pub single: Vec<OutputFile>,
    pub bulk: Vec<BulkGroup>,
}

fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(AUDIO_EXT))
}

/// Audio files directly inside `dir`, sorted by name. A missing directory is
/// an empty list.
async fn list_audio(dir: &Path) -> Result<Vec<OutputFile>, AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        let path = entry.path();
        if !meta.is_file() || !is_audio(&path) {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        files.push(OutputFile {
            meta: parse_single_filename(&file_name),
            file_name,
            size: meta.len(),
        });
    }
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

async fn list_groups(dir: &Path) -> Result<Vec<BulkGroup>, AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut groups = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let mut files = list_audio(&entry.path()).await?;
        for file in &mut files {
            file.meta = None;
        }
        groups.push(BulkGroup {
            name: entry.file_name().to_string_lossy().into_owned(),
            files,
        });
    }
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(groups)
}

/// Everything this session has generated. Nothing is created on disk.
pub async fn list_session_outputs(session: &mut SessionContext) -> Result<OutputListing, AppError> {
    Ok(OutputListing {
        single: list_audio(&session.single_path()).await?,
        bulk: list_groups(&session.bulk_path()).await?,
    })
}

/// Resolve a browser-supplied name inside `dir`, refusing anything that
/// would not survive the sanitizer unchanged or that leaves the session.
fn resolve(
    session: &mut SessionContext,
    dir: PathBuf,
    name: &str,
    max_length: usize,
) -> Result<PathBuf, AppError> {
    let file = PathComponent::exact(name, max_length)
        .ok_or_else(|| AppError::NotFound(format!("File '{}'", name)))?;
    let path = dir.join(file);
    if !validate_path_within_base(&path, session.session_path()) {
        return Err(AppError::PathEscape(path.display().to_string()));
    }
    Ok(path)
}

async fn read_file(path: &Path, name: &str) -> Result<Vec<u8>, AppError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound(format!("File '{}'", name)))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn read_single_file(
    session: &mut SessionContext,
    name: &str,
    max_length: usize,
) -> Result<Vec<u8>, AppError> {
    let dir = session.single_path();
    let path = resolve(session, dir, name, max_length)?;
    read_file(&path, name).await
}

pub async fn read_bulk_file(
    session: &mut SessionContext,
    group: &str,
    name: &str,
    max_length: usize,
) -> Result<Vec<u8>, AppError> {
    let group_dir = PathComponent::exact_component(group, max_length)
        .ok_or_else(|| AppError::NotFound(format!("Batch '{}'", group)))?;
    let dir = session.bulk_path().join(group_dir);
    let path = resolve(session, dir, name, max_length)?;
    read_file(&path, name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_single_name_round_trips_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let name = single_file_name("en_US", "Rachel/Calm", at, 100);
        let meta = parse_single_filename(name.as_str()).unwrap();
        assert_eq!(meta.language, "en-US");
        assert_eq!(meta.voice, "Rachel-Calm");
        assert_eq!(meta.created, "20240309-140507");
        assert_eq!(meta.id.len(), 8);
    }

    #[test]
    fn test_unrelated_names_have_no_meta() {
        assert!(parse_single_filename("greeting.mp3").is_none());
        assert!(parse_single_filename("a_b_c_d.mp3").is_none());
    }
}
