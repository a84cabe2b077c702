//! OpenRouter client: script enhancement, translation and phonetic
//! conversion through any model on the OpenRouter gateway.
//!
//! The API is OpenAI-compatible; completions are requested non-streaming and
//! parsed with `llm::parse_completion`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;
use crate::services::llm::{self, ChatMessage, EnhancementStyle};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_MODELS_URL: &str = "https://openrouter.ai/api/v1/models";

/// Options for one completion call.
pub struct OpenRouterCallOptions {
    /// OpenRouter model ID, e.g. "openai/gpt-4o", "minimax/minimax-m2:free".
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(default)]
    pub prompt: Option<serde_json::Value>,
    #[serde(default)]
    pub completion: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterModel {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pricing: ModelPricing,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<OpenRouterModel>,
}

pub struct OpenRouterClient {
    http: Client,
    api_key: String,
}

impl OpenRouterClient {
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

    /// Run a chat completion and return the assistant text.
    pub async fn complete(&self, opts: &OpenRouterCallOptions) -> Result<String, AppError> {
        let body = serde_json::json!({
            "model": opts.model,
            "messages": opts.messages,
            "max_tokens": opts.max_tokens.unwrap_or(1024),
            "temperature": opts.temperature.unwrap_or(0.7),
        });

        let resp = self
            .http
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("X-Title", "ElevenTools")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenRouter request failed: {}", e);
                AppError::api("OpenRouter request failed", e.to_string())
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let err_body = resp.text().await.unwrap_or_default();
            tracing::error!("OpenRouter returned {}: {}", status, err_body);
            return Err(AppError::api(
                "OpenRouter request failed",
                format!("status {}: {}", status, err_body),
            ));
        }

        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::api("Unexpected OpenRouter response", e.to_string()))?;
        llm::parse_completion(&value)
            .ok_or_else(|| AppError::api("OpenRouter returned no content", value.to_string()))
    }

    pub async fn enhance_script(
        &self,
        script: &str,
        guidance: &str,
        style: EnhancementStyle,
        model: &str,
    ) -> Result<String, AppError> {
        self.complete(&OpenRouterCallOptions {
            model: model.to_string(),
            messages: llm::enhancement_messages(script, guidance, style),
            max_tokens: Some(1024),
            temperature: Some(0.7),
        })
        .await
    }

    pub async fn translate(&self, text: &str, language: &str, model: &str) -> Result<String, AppError> {
        self.complete(&OpenRouterCallOptions {
            model: model.to_string(),
            messages: vec![ChatMessage::user(llm::translation_prompt(text, language))],
            max_tokens: Some(1024),
            temperature: Some(0.7),
        })
        .await
    }

    pub async fn convert_word_to_phonetic(
        &self,
        word: &str,
        language: &str,
        model: &str,
        speech_model_id: Option<&str>,
    ) -> Result<String, AppError> {
        self.complete(&OpenRouterCallOptions {
            model: model.to_string(),
            messages: vec![ChatMessage::user(llm::phonetic_prompt(word, language, speech_model_id))],
            max_tokens: Some(64),
            temperature: Some(0.2),
        })
        .await
    }

    pub async fn fetch_models(&self) -> Result<Vec<OpenRouterModel>, AppError> {
        let resp = self
            .http
            .get(OPENROUTER_MODELS_URL)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::api("Failed to fetch models from OpenRouter", e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let err_body = resp.text().await.unwrap_or_default();
            return Err(AppError::api(
                "Failed to fetch models from OpenRouter",
                format!("status {}: {}", status, err_body),
            ));
        }

        let models: ModelsResponse = resp
            .json()
            .await
            .map_err(|e| AppError::api("Unexpected OpenRouter models response", e.to_string()))?;
        Ok(models.data)
    }
}

// ---------------------------------------------------------------------------
// Model list helpers
// ---------------------------------------------------------------------------

/// OpenRouter reports prices as strings ("0") or numbers.
fn is_zero_price(price: &Option<serde_json::Value>) -> bool {
    match price {
        Some(serde_json::Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok() == Some(0.0),
        _ => false,
    }
}

/// Free: id ends with `:free`, or both prompt and completion cost zero.
pub fn is_free_model(model: &OpenRouterModel) -> bool {
    model.id.ends_with(":free")
        || (is_zero_price(&model.pricing.prompt) && is_zero_price(&model.pricing.completion))
}

pub fn filter_free_models(models: Vec<OpenRouterModel>, free_only: bool) -> Vec<OpenRouterModel> {
    if !free_only {
        return models;
    }
    models.into_iter().filter(is_free_model).collect()
}

/// Case-insensitive search over id and display name. Id prefix matches rank
/// first, then other id matches, then name-only matches.
pub fn search_models(models: Vec<OpenRouterModel>, query: &str) -> Vec<OpenRouterModel> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return models;
    }

    let mut scored: Vec<(u8, OpenRouterModel)> = models
        .into_iter()
        .filter_map(|m| {
            let id = m.id.to_lowercase();
            let name = m.name.as_deref().unwrap_or("").to_lowercase();
            let score = if id.starts_with(&query) {
                3
            } else if id.contains(&query) {
                2
            } else if name.contains(&query) {
                1
            } else {
                0
            };
            (score > 0).then_some((score, m))
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, m)| m).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str, name: &str, prompt: serde_json::Value, completion: serde_json::Value) -> OpenRouterModel {
        OpenRouterModel {
            id: id.into(),
            name: Some(name.into()),
            pricing: ModelPricing {
                prompt: Some(prompt),
                completion: Some(completion),
            },
        }
    }

    #[test]
    fn test_free_models() {
        let models = vec![
            model("minimax/minimax-m2:free", "MiniMax", "0.1".into(), "0.1".into()),
            model("meta/llama", "Llama", "0".into(), serde_json::json!(0)),
            model("openai/gpt-4o", "GPT-4o", "0.000005".into(), "0.000015".into()),
        ];
        let free = filter_free_models(models.clone(), true);
        let ids: Vec<_> = free.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["minimax/minimax-m2:free", "meta/llama"]);
        assert_eq!(filter_free_models(models, false).len(), 3);
    }

    #[test]
    fn test_search_ranks_id_prefix_first() {
        let models = vec![
            model("x/gpt-clone", "Clone", "1".into(), "1".into()),
            model("openai/gpt-4o", "GPT-4o", "1".into(), "1".into()),
            model("other", "Mentions Openai", "1".into(), "1".into()),
            model("meta/llama", "Llama", "1".into(), "1".into()),
        ];
        let found = search_models(models, "OpenAI");
        let ids: Vec<_> = found.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["openai/gpt-4o", "other"]);
    }

    #[test]
    fn test_blank_search_returns_all() {
        let models = vec![model("a", "A", "1".into(), "1".into())];
        assert_eq!(search_models(models, "   ").len(), 1);
    }
}
