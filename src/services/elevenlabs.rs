//! ElevenLabs client: text-to-speech, model/voice listing and voice design.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppError;
use crate::services::model_capabilities::supports_speed;

const ELEVENLABS_API: &str = "https://api.elevenlabs.io/v1";

/// Text the voice-design endpoint speaks in its previews.
const PREVIEW_SAMPLE_TEXT: &str = "Hello! I'm excited to demonstrate my voice capabilities. \
I can speak clearly and naturally, adapting my tone to different contexts. \
Whether it's casual conversation, professional presentations, or storytelling, \
I aim to deliver high-quality, engaging audio that meets your needs. \
How can I help bring your content to life today?";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
            style: 0.0,
            use_speaker_boost: false,
            speed: None,
        }
    }
}

impl VoiceSettings {
    pub fn validate(&self, model_id: &str) -> Result<(), AppError> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.stability) {
            return Err(AppError::validation("Stability must be between 0 and 1"));
        }
        if !unit.contains(&self.similarity_boost) {
            return Err(AppError::validation("Similarity boost must be between 0 and 1"));
        }
        if !unit.contains(&self.style) {
            return Err(AppError::validation("Style must be between 0 and 1"));
        }
        if let Some(speed) = self.speed {
            if !supports_speed(model_id) {
                return Err(AppError::validation(format!(
                    "Speed is not supported by model '{}'",
                    model_id
                )));
            }
            if !(0.5..=2.0).contains(&speed) {
                return Err(AppError::validation("Speed must be between 0.5 and 2.0"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub voice_id: String,
    pub model_id: String,
    pub text: String,
    pub voice_settings: VoiceSettings,
    pub seed: Option<u64>,
    pub language_code: Option<String>,
}

/// Voice and model ids are interpolated into URLs; keep them to id characters.
fn is_api_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl SpeechRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.text.trim().is_empty() {
            return Err(AppError::validation("Text to speak cannot be empty"));
        }
        if !is_api_id(&self.voice_id) {
            return Err(AppError::validation("A valid voice must be selected"));
        }
        if !is_api_id(&self.model_id) {
            return Err(AppError::validation("A valid model must be selected"));
        }
        self.voice_settings.validate(&self.model_id)
    }

    pub fn payload(&self) -> serde_json::Value {
        let mut payload = json!({
            "text": self.text,
            "model_id": self.model_id,
            "voice_settings": self.voice_settings,
        });
        if let Some(seed) = self.seed {
            payload["seed"] = json!(seed);
        }
        if let Some(code) = self.language_code.as_deref().filter(|c| !c.is_empty()) {
            payload["language_code"] = json!(code);
        }
        payload
    }
}

#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    pub audio: Vec<u8>,
    /// Seed reported back in the `x-seed` header.
    pub seed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicePreview {
    pub generated_voice_id: String,
    #[serde(rename(deserialize = "audio_base_64"))]
    pub audio_base64: String,
}

#[derive(Debug, Deserialize)]
struct PreviewsResponse {
    previews: Vec<VoicePreview>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedVoice {
    pub voice_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Synthesizer seam
// ---------------------------------------------------------------------------

/// Anything that can turn a [`SpeechRequest`] into audio bytes.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(
        &self,
        request: &SpeechRequest,
    ) -> impl Future<Output = Result<SynthesizedSpeech, AppError>> + Send;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ElevenLabsClient {
    http: Client,
    api_key: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::api("HTTP client error", e.to_string()))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        what: &str,
    ) -> Result<T, AppError> {
        let resp = self
            .http
            .get(format!("{}{}", ELEVENLABS_API, path))
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::api(format!("Failed to fetch {}", what), e.to_string()))?;
        let resp = check_status(resp, &format!("Failed to fetch {}", what)).await?;
        resp.json::<T>()
            .await
            .map_err(|e| AppError::api(format!("Unexpected {} response", what), e.to_string()))
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        failure: &str,
    ) -> Result<reqwest::Response, AppError> {
        let resp = self
            .http
            .post(format!("{}{}", ELEVENLABS_API, path))
            .header("xi-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::api(failure, e.to_string()))?;
        check_status(resp, failure).await
    }

    pub async fn fetch_models(&self) -> Result<Vec<ModelInfo>, AppError> {
        self.get_json("/models", "models").await
    }

    pub async fn fetch_voices(&self) -> Result<Vec<VoiceInfo>, AppError> {
        let voices: VoicesResponse = self.get_json("/voices", "voices").await?;
        Ok(voices.voices)
    }

    /// Generate voice previews from a free-text description.
    pub async fn create_voice_previews(
        &self,
        voice_description: &str,
    ) -> Result<Vec<VoicePreview>, AppError> {
        if voice_description.trim().is_empty() {
            return Err(AppError::validation("Voice description cannot be empty"));
        }
        let body = json!({
            "text": PREVIEW_SAMPLE_TEXT,
            "voice_description": voice_description,
        });
        let resp = self
            .post_json(
                "/text-to-voice/create-previews",
                &body,
                "Failed to generate voice previews",
            )
            .await?;
        let previews: PreviewsResponse = resp.json().await.map_err(|e| {
            AppError::api("Unexpected voice preview response", e.to_string())
        })?;
        Ok(previews.previews)
    }

    /// Save one of the generated previews as a permanent voice.
    pub async fn create_voice_from_preview(
        &self,
        voice_name: &str,
        voice_description: &str,
        generated_voice_id: &str,
        played_ids: &[String],
    ) -> Result<CreatedVoice, AppError> {
        if voice_name.trim().is_empty() {
            return Err(AppError::validation("Voice name cannot be empty"));
        }
        if voice_description.trim().is_empty() {
            return Err(AppError::validation("Voice description cannot be empty"));
        }
        if generated_voice_id.trim().is_empty() {
            return Err(AppError::validation("Generated voice ID cannot be empty"));
        }

        let body = json!({
            "voice_name": voice_name,
            "voice_description": voice_description,
            "generated_voice_id": generated_voice_id,
            "labels": {"language": "en"},
            "played_not_selected_voice_ids": played_ids,
        });
        let resp = self
            .post_json(
                "/text-to-voice/create-voice-from-preview",
                &body,
                "Failed to create voice from preview",
            )
            .await?;
        resp.json()
            .await
            .map_err(|e| AppError::api("Unexpected create-voice response", e.to_string()))
    }
}

impl SpeechSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedSpeech, AppError> {
        request.validate()?;
        let payload = request.payload();
        tracing::debug!(
            "Sending text-to-speech request: voice={} model={} chars={}",
            request.voice_id,
            request.model_id,
            request.text.chars().count()
        );

        let resp = self
            .post_json(
                &format!("/text-to-speech/{}", request.voice_id),
                &payload,
                "Failed to generate audio",
            )
            .await?;

        let seed = resp
            .headers()
            .get("x-seed")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let audio = resp
            .bytes()
            .await
            .map_err(|e| AppError::api("Failed to read generated audio", e.to_string()))?;

        tracing::info!("Audio generated ({} bytes, seed {:?})", audio.len(), seed);
        Ok(SynthesizedSpeech {
            audio: audio.to_vec(),
            seed,
        })
    }
}

async fn check_status(resp: reqwest::Response, failure: &str) -> Result<reqwest::Response, AppError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(AppError::api(failure, format!("ElevenLabs returned {}: {}", status, body)))
}
