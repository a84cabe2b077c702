use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::utils::limits::{self, ResourceLimits};

pub const DEFAULT_LLM_MODEL: &str = "minimax/minimax-m2:free";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    /// Shared root for every session's generated audio.
    pub outputs_dir: PathBuf,
    pub elevenlabs_api_key: String,
    pub openrouter_api_key: String,
    pub ollama_model: String,
    pub default_enhancement_model: String,
    pub default_translation_model: String,
    pub max_upload_size: usize,
    pub max_rows: usize,
    pub max_text_length: usize,
    pub max_filename_length: usize,
    pub session_max_age_hours: u64,
    pub cleanup_interval_secs: u64,
}

fn parsed<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parsed("PORT", 3501),
            cors_origin: env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3500".into()),
            outputs_dir: env::var("OUTPUTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./outputs")),
            elevenlabs_api_key: env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            openrouter_api_key: env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2:3b".into()),
            default_enhancement_model: env::var("DEFAULT_ENHANCEMENT_MODEL")
                .unwrap_or_else(|_| DEFAULT_LLM_MODEL.into()),
            default_translation_model: env::var("DEFAULT_TRANSLATION_MODEL")
                .unwrap_or_else(|_| DEFAULT_LLM_MODEL.into()),
            max_upload_size: parsed("MAX_UPLOAD_SIZE", limits::MAX_CSV_SIZE),
            max_rows: parsed("MAX_ROWS", limits::MAX_DF_ROWS),
            max_text_length: parsed("MAX_TEXT_LENGTH", limits::MAX_TEXT_LENGTH),
            max_filename_length: parsed("MAX_FILENAME_LENGTH", limits::MAX_FILENAME_LENGTH),
            session_max_age_hours: parsed("SESSION_MAX_AGE_HOURS", 24),
            cleanup_interval_secs: parsed("CLEANUP_INTERVAL_SECS", 3600),
        }
    }

    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            max_upload_bytes: self.max_upload_size,
            max_rows: self.max_rows,
            max_text_chars: self.max_text_length,
            max_filename_chars: self.max_filename_length,
        }
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::from_secs(self.session_max_age_hours.saturating_mul(3600))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origin
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        let limits = ResourceLimits::default();
        Self {
            port: 3501,
            cors_origin: "http://localhost:3500".into(),
            outputs_dir: PathBuf::from("./outputs"),
            elevenlabs_api_key: String::new(),
            openrouter_api_key: String::new(),
            ollama_model: "llama3.2:3b".into(),
            default_enhancement_model: DEFAULT_LLM_MODEL.into(),
            default_translation_model: DEFAULT_LLM_MODEL.into(),
            max_upload_size: limits.max_upload_bytes,
            max_rows: limits.max_rows,
            max_text_length: limits.max_text_chars,
            max_filename_length: limits.max_filename_chars,
            session_max_age_hours: 24,
            cleanup_interval_secs: 3600,
        }
    }
}
