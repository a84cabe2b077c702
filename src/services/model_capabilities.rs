//! Which voice settings an ElevenLabs model accepts.
//!
//! Known model ids are matched against an allow-list first; unknown ids fall
//! back to naming patterns so newly released models work without a change.

use serde::Serialize;

const SPEED_SUPPORTED_MODELS: &[&str] = &[
    "eleven_multilingual_v2",
    "eleven_turbo_v2_5",
    "eleven_flash_v2_5",
    "eleven_v3",
    "eleven_multilingual_sts_v2",
];

const SPEED_SUPPORT_PATTERNS: &[&str] = &["multilingual", "turbo_v2", "flash_v2"];

const AUDIO_TAGS_SUPPORTED_MODELS: &[&str] = &["eleven_v3", "eleven_multilingual_v3"];

const AUDIO_TAGS_SUPPORT_PATTERNS: &[&str] = &["_v3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCapabilities {
    pub speed: bool,
    pub audio_tags: bool,
}

fn matches(model_id: &str, allow: &[&str], patterns: &[&str]) -> bool {
    if model_id.is_empty() {
        return false;
    }
    if allow.contains(&model_id) {
        return true;
    }
    let lower = model_id.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

pub fn supports_speed(model_id: &str) -> bool {
    matches(model_id, SPEED_SUPPORTED_MODELS, SPEED_SUPPORT_PATTERNS)
}

/// Audio Tags (`[whispers]`, `[laughs]`, ...) are a v3 feature.
pub fn supports_audio_tags(model_id: &str) -> bool {
    matches(model_id, AUDIO_TAGS_SUPPORTED_MODELS, AUDIO_TAGS_SUPPORT_PATTERNS)
}

pub fn model_capabilities(model_id: &str) -> ModelCapabilities {
    ModelCapabilities {
        speed: supports_speed(model_id),
        audio_tags: supports_audio_tags(model_id),
    }
}
