use crate::error::AppError;

const PLACEHOLDER_KEYS: &[&str] = &["your-api-key-here"];

/// Check that an API key is present and is not an obvious placeholder.
///
/// Runs before any external call so a missing key never costs a round trip.
pub fn validate_api_key(api_key: Option<&str>, service: &str) -> Result<String, AppError> {
    let key = api_key.map(str::trim).unwrap_or("");
    if key.is_empty() {
        return Err(AppError::configuration(
            format!("{} API key not found", service),
            format!(
                "Enter your {} API key on the Settings page or set it in the server environment",
                service
            ),
        ));
    }
    if key.starts_with("sk-dummy") || PLACEHOLDER_KEYS.contains(&key) {
        return Err(AppError::configuration(
            format!("Invalid {} API key", service),
            format!("Replace the placeholder {} API key with a real one", service),
        ));
    }
    Ok(key.to_string())
}

/// Pick the key the user entered for this session, falling back to the
/// server-wide one.
pub fn resolve_api_key<'a>(session_key: Option<&'a str>, configured: &'a str) -> Option<&'a str> {
    session_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| Some(configured).filter(|k| !k.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key() {
        let err = validate_api_key(None, "ElevenLabs").unwrap_err();
        assert_eq!(err.to_string(), "ElevenLabs API key not found");
        assert!(validate_api_key(Some("   "), "ElevenLabs").is_err());
    }

    #[test]
    fn test_placeholder_key() {
        let err = validate_api_key(Some("sk-dummy-123"), "OpenRouter").unwrap_err();
        assert_eq!(err.to_string(), "Invalid OpenRouter API key");
        assert!(validate_api_key(Some("your-api-key-here"), "OpenRouter").is_err());
    }

    #[test]
    fn test_valid_key_trimmed() {
        assert_eq!(validate_api_key(Some(" xi-123 "), "ElevenLabs").unwrap(), "xi-123");
    }

    #[test]
    fn test_session_key_wins() {
        assert_eq!(resolve_api_key(Some("mine"), "server"), Some("mine"));
        assert_eq!(resolve_api_key(Some(""), "server"), Some("server"));
        assert_eq!(resolve_api_key(None, ""), None);
    }
}
