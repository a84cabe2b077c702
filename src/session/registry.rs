use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;

use crate::session::SessionId;

/// Settings a user enters for their own session. Held in memory only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSettings {
    pub elevenlabs_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub enhancement_model: Option<String>,
    pub translation_model: Option<String>,
}

impl SessionSettings {
    /// Overlay `update` on top of `self`. Empty strings clear a field.
    pub fn merge(&mut self, update: SessionSettings) {
        fn apply(slot: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value {
                let value = value.trim().to_string();
                *slot = (!value.is_empty()).then_some(value);
            }
        }
        apply(&mut self.elevenlabs_api_key, update.elevenlabs_api_key);
        apply(&mut self.openrouter_api_key, update.openrouter_api_key);
        apply(&mut self.enhancement_model, update.enhancement_model);
        apply(&mut self.translation_model, update.translation_model);
    }
}

struct Entry {
    settings: SessionSettings,
    last_seen: Instant,
}

/// In-memory state keyed by session id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    entries: Arc<DashMap<SessionId, Entry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity, registering the session on first sight.
    pub fn touch(&self, id: SessionId) {
        self.entries
            .entry(id)
            .and_modify(|e| e.last_seen = Instant::now())
            .or_insert_with(|| Entry {
                settings: SessionSettings::default(),
                last_seen: Instant::now(),
            });
    }

    pub fn settings(&self, id: SessionId) -> SessionSettings {
        self.entries
            .get(&id)
            .map(|e| e.settings.clone())
            .unwrap_or_default()
    }

    pub fn update(&self, id: SessionId, update: SessionSettings) -> SessionSettings {
        let mut entry = self.entries.entry(id).or_insert_with(|| Entry {
            settings: SessionSettings::default(),
            last_seen: Instant::now(),
        });
        entry.settings.merge(update);
        entry.last_seen = Instant::now();
        entry.settings.clone()
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many.
    pub fn forget_idle(&self, max_idle: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.last_seen.elapsed() <= max_idle);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_session_has_default_settings() {
        let registry = SessionRegistry::new();
        let settings = registry.settings(SessionId::new());
        assert!(settings.elevenlabs_api_key.is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_and_clear() {
        let registry = SessionRegistry::new();
        let id = SessionId::new();
        registry.update(
            id,
            SessionSettings {
                elevenlabs_api_key: Some(" xi-key ".into()),
                ..Default::default()
            },
        );
        assert_eq!(registry.settings(id).elevenlabs_api_key.as_deref(), Some("xi-key"));

        registry.update(
            id,
            SessionSettings {
                elevenlabs_api_key: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(registry.settings(id).elevenlabs_api_key.is_none());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new();
        let a = SessionId::new();
        let b = SessionId::new();
        registry.update(
            a,
            SessionSettings {
                openrouter_api_key: Some("or-a".into()),
                ..Default::default()
            },
        );
        registry.touch(b);
        assert!(registry.settings(b).openrouter_api_key.is_none());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_forget_idle_keeps_recent() {
        let registry = SessionRegistry::new();
        registry.touch(SessionId::new());
        assert_eq!(registry.forget_idle(Duration::from_secs(3600)), 0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(registry.forget_idle(Duration::ZERO), 1);
    }
}
