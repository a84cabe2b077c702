pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod session;
pub mod utils;

use crate::error::AppError;
use crate::services::elevenlabs::ElevenLabsClient;
use crate::services::openrouter::OpenRouterClient;
use crate::session::{OutputRoot, SessionId, SessionRegistry};
use crate::utils::api_keys::{resolve_api_key, validate_api_key};

#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub outputs: OutputRoot,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self {
            outputs: OutputRoot::new(config.outputs_dir.clone()),
            sessions: SessionRegistry::new(),
            config,
        }
    }

    /// ElevenLabs client for `session`, preferring the key the user entered.
    pub fn elevenlabs(&self, session: SessionId) -> Result<ElevenLabsClient, AppError> {
        let settings = self.sessions.settings(session);
        let key = validate_api_key(
            resolve_api_key(
                settings.elevenlabs_api_key.as_deref(),
                &self.config.elevenlabs_api_key,
            ),
            "ElevenLabs",
        )?;
        ElevenLabsClient::new(key)
    }

    pub fn openrouter(&self, session: SessionId) -> Result<OpenRouterClient, AppError> {
        let settings = self.sessions.settings(session);
        let key = validate_api_key(
            resolve_api_key(
                settings.openrouter_api_key.as_deref(),
                &self.config.openrouter_api_key,
            ),
            "OpenRouter",
        )?;
        OpenRouterClient::new(key)
    }
}
