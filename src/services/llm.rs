//! Prompt construction for the LLM-backed script tools.
//!
//! Provides:
//! - `enhancement_messages()`: rewrite a script for more expressive speech
//! - `translation_prompt()`: translate a script
//! - `phonetic_prompt()`: phonetic spelling of one word in one language

use serde::{Deserialize, Serialize};

use crate::services::model_capabilities::supports_audio_tags;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenRouter,
    Ollama,
}

/// Which enhancement style a target speech model calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancementStyle {
    /// Square-bracket Audio Tags understood by v3 models.
    AudioTags,
    /// Pauses, emphasis and `<break>`/`<phoneme>` markup for older models.
    Classic,
}

impl EnhancementStyle {
    pub fn for_model(model_id: Option<&str>) -> Self {
        match model_id {
            Some(id) if supports_audio_tags(id) => Self::AudioTags,
            _ => Self::Classic,
        }
    }
}

// ---------------------------------------------------------------------------
// Enhancement
// ---------------------------------------------------------------------------

const AUDIO_TAGS_GUIDE: &str = r#"# Enhance the following script for ElevenLabs v3 Text-to-Speech using Audio Tags.

ElevenLabs v3 models support Audio Tags - square-bracketed tags that control emotion, delivery, and natural speech patterns. Use Audio Tags instead of XML tags.

## Apply the following Audio Tags techniques:

1. **Emotions**: [excited], [sad], [angry], [happily], [sorrowful], [fearful], [confident]
2. **Delivery**: [whispers], [shouts], [French accent], [monotone]
3. **Human reactions**: [laughs], [chuckles], [clears throat], [sighs], [gasps]
4. **Sound effects** (sparingly, only when the script calls for it): [clapping], [explosion]

## Guidelines:
- Place Audio Tags immediately before the text they modify
- Use tags naturally, do not overuse them
- Maintain the original meaning and flow of the script"#;

const CLASSIC_GUIDE: &str = r#"# Enhance the following script for text-to-speech purposes, focusing on creating a natural and expressive output.

## Apply the following techniques:
1. **Pauses:** Use <break time="1s" /> tags to add natural pauses in speech.
2. **Emotional context:** Use <emotional context> tags to convey emotions.
3. **Emphasis:** Apply strategic capitalization for important words or phrases.
4. **Pacing:** Add descriptive language and line breaks to control speed and rhythm.
5. **Question emphasis:** Use multiple question marks for dramatic effect.
6. **Dynamic speech:** Vary sentence structure and emphasis.
7. **Pronunciation:** Use <phoneme> tags for unusual pronunciations."#;

const DEFAULT_GUIDANCE: &str =
    "Use the existing context to improve the script, keeping in mind the techniques above.";

/// Full enhancement prompt for a script. Shared by OpenRouter and Ollama.
pub fn enhancement_prompt(script: &str, guidance: &str, style: EnhancementStyle) -> String {
    let (guide, closing) = match style {
        EnhancementStyle::AudioTags => (
            AUDIO_TAGS_GUIDE,
            "The enhanced script should use Audio Tags in square brackets [like this] and be ready for ElevenLabs v3 text-to-speech synthesis.",
        ),
        EnhancementStyle::Classic => (
            CLASSIC_GUIDE,
            "The enhanced script should be ready for text-to-speech synthesis.",
        ),
    };
    let guidance = if guidance.trim().is_empty() {
        DEFAULT_GUIDANCE
    } else {
        guidance.trim()
    };

    format!(
        "{guide}\n\n{guidance}\n\nScript to enhance:\n{script}\n\n\
IMPORTANT: Provide ONLY the enhanced script as your response. Do not include any explanations, notes, or additional text. \
{closing} Maintain the overall flow and coherence of the original text."
    )
}

pub fn enhancement_messages(script: &str, guidance: &str, style: EnhancementStyle) -> Vec<ChatMessage> {
    let system = match style {
        EnhancementStyle::AudioTags => "You are a helpful assistant specializing in ElevenLabs v3 Audio Tags script enhancement.",
        EnhancementStyle::Classic => "You are a helpful assistant for text-to-speech script enhancement.",
    };
    vec![
        ChatMessage::system(system),
        ChatMessage::user(enhancement_prompt(script, guidance, style)),
    ]
}

// ---------------------------------------------------------------------------
// Translation / phonetics
// ---------------------------------------------------------------------------

pub fn translation_prompt(text: &str, language: &str) -> String {
    format!("Translate the following text to {language}:\n\n{text}")
}

/// Prompt for the phonetic spelling of `word` as pronounced in `language`.
///
/// Older monolingual speech models read the spelling in English, so for them
/// the prompt asks for a respelling rather than a pronunciation guide.
pub fn phonetic_prompt(word: &str, language: &str, speech_model_id: Option<&str>) -> String {
    if speech_model_id == Some("eleven_monolingual_v1") {
        format!(
            "You speak perfect {language}. Convert the word \"{word}\" into the phonetic spelling appropriate for the {language} language. \
Only respond with the phonetic spelling of the word, nothing else."
        )
    } else {
        format!(
            "You speak perfect {language}. Your goal is to pronounce the word \"{word}\" correctly and help me not sound like a tourist. \
Only respond with the phonetic pronunciation of the word, nothing else."
        )
    }
}

/// Extract the assistant text from an OpenAI-style (non-streaming) completion.
pub fn parse_completion(body: &serde_json::Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
