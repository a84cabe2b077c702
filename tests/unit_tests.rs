//! Unit tests for the ElevenTools server.
//! These tests don't touch the network or the filesystem.

#[cfg(test)]
mod config_tests {
    use eleventools_server::config::Config;

    #[test]
    fn test_cors_origins_parsing() {
        let config = Config {
            cors_origin: "http://localhost:3500, https://tools.example.com".into(),
            ..Config::default()
        };
        let origins = config.cors_origins();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "http://localhost:3500");
        assert_eq!(origins[1], "https://tools.example.com");
    }

    #[test]
    fn test_wildcard_cors() {
        let config = Config {
            cors_origin: "*".into(),
            ..Config::default()
        };
        assert_eq!(config.cors_origins(), vec!["*"]);
    }

    #[test]
    fn test_limits_follow_config() {
        let config = Config {
            max_upload_size: 2048,
            max_rows: 5,
            max_text_length: 50,
            max_filename_length: 40,
            ..Config::default()
        };
        let limits = config.limits();
        assert_eq!(limits.max_upload_bytes, 2048);
        assert_eq!(limits.max_rows, 5);
        assert_eq!(limits.max_text_chars, 50);
        assert_eq!(limits.max_filename_chars, 40);
    }

    #[test]
    fn test_retention_window() {
        let config = Config {
            session_max_age_hours: 2,
            cleanup_interval_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.session_max_age().as_secs(), 7200);
        // A zero interval would spin the sweep.
        assert_eq!(config.cleanup_interval().as_secs(), 1);
    }

    #[test]
    fn test_huge_retention_saturates() {
        let config = Config {
            session_max_age_hours: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.session_max_age().as_secs(), u64::MAX);
    }
}

#[cfg(test)]
mod template_tests {
    use std::collections::HashMap;

    use eleventools_server::utils::template::{
        find_phonetic_directives, substitute_phonetic_directives, substitute_variables,
        unique_variables, PhoneticDirective,
    };

    #[test]
    fn test_repeated_variable_gets_one_value() {
        let text = "Hi {name}! Bye {name}.";
        assert_eq!(unique_variables(text), vec!["name"]);

        let values = HashMap::from([("name".to_string(), "Ada".to_string())]);
        assert_eq!(substitute_variables(text, &values), "Hi Ada! Bye Ada.");
    }

    #[test]
    fn test_unknown_variable_left_in_place() {
        let values = HashMap::from([("a".to_string(), "1".to_string())]);
        assert_eq!(substitute_variables("{a} {b}", &values), "1 {b}");
    }

    #[test]
    fn test_phonetic_round() {
        let text = "Say [[French:croissant]] twice: [[French:croissant]]";
        let found = find_phonetic_directives(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], PhoneticDirective::new("French", "croissant"));

        let conversions = HashMap::from([(found[0].clone(), "kwah-SAHN".to_string())]);
        assert_eq!(
            substitute_phonetic_directives(text, &conversions),
            "Say kwah-SAHN twice: kwah-SAHN"
        );
    }
}

#[cfg(test)]
mod sanitize_tests {
    use eleventools_server::utils::sanitize::{
        sanitize_filename, sanitize_path_component, validate_path_within_base, PathComponent,
    };

    #[test]
    fn test_sanitized_names_stay_inside_root() {
        let root = std::path::Path::new("/srv/outputs/session");
        for raw in ["../../etc/passwd", "..", "a/../../b", "C:\\Windows", "\u{0}x"] {
            let component = PathComponent::sanitize(raw, 100);
            assert!(
                validate_path_within_base(root.join(&component), root),
                "{raw:?} escaped as {component}"
            );
        }
    }

    #[test]
    fn test_sanitizer_is_idempotent() {
        let long = "ß".repeat(120);
        for raw in ["hello world.mp3", " ..x.. ", "a:b*c?.csv", long.as_str()] {
            let once = sanitize_filename(raw, 100);
            assert_eq!(sanitize_filename(&once, 100), once);
            let once = sanitize_path_component(raw, 100);
            assert_eq!(sanitize_path_component(&once, 100), once);
        }
    }

    #[test]
    fn test_zero_length_limit() {
        assert_eq!(sanitize_path_component("abc", 0), "a");
    }
}

#[cfg(test)]
mod sanitize_property_tests {
    use std::path::Path;

    use eleventools_server::utils::sanitize::{
        sanitize_filename, sanitize_path_component, validate_path_within_base,
    };
    use proptest::prelude::*;

    fn raw_names() -> impl Strategy<Value = String> {
        prop_oneof![any::<String>(), "[a-z0-9 ./\\\\:]{0,40}"]
    }

    fn check_segment(out: &str, max_length: usize) -> Result<(), TestCaseError> {
        prop_assert!(!out.contains('/') && !out.contains('\\'), "separator in {:?}", out);
        prop_assert!(out != "." && out != "..", "dot segment {:?}", out);
        prop_assert!(!out.is_empty());
        prop_assert!(out.chars().count() <= max_length.max(1));

        let root = Path::new("/srv/outputs/session");
        prop_assert!(validate_path_within_base(root.join(out), root));
        Ok(())
    }

    proptest! {
        #[test]
        fn path_component_is_safe_and_stable(raw in raw_names(), max_length in 0usize..200) {
            let once = sanitize_path_component(&raw, max_length);
            check_segment(&once, max_length)?;
            prop_assert_eq!(sanitize_path_component(&once, max_length), once);
        }

        #[test]
        fn filename_is_safe_and_stable(raw in raw_names(), max_length in 0usize..200) {
            let once = sanitize_filename(&raw, max_length);
            check_segment(&once, max_length)?;
            prop_assert_eq!(sanitize_filename(&once, max_length), once);
        }
    }
}

#[cfg(test)]
mod api_key_tests {
    use eleventools_server::error::AppError;
    use eleventools_server::utils::api_keys::{resolve_api_key, validate_api_key};

    #[test]
    fn test_session_key_wins() {
        assert_eq!(resolve_api_key(Some("user-key"), "server-key"), Some("user-key"));
        assert_eq!(resolve_api_key(None, "server-key"), Some("server-key"));
        assert_eq!(resolve_api_key(Some("  "), ""), None);
    }

    #[test]
    fn test_placeholder_is_configuration_error() {
        let err = validate_api_key(Some("sk-dummy-123"), "ElevenLabs").unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
        assert_eq!(err.status().as_u16(), 400);
    }
}

#[cfg(test)]
mod bulk_planning_tests {
    use eleventools_server::error::AppError;
    use eleventools_server::services::bulk::{parse_bulk_csv, plan_clips};
    use eleventools_server::utils::limits::ResourceLimits;

    fn limits() -> ResourceLimits {
        ResourceLimits::default()
    }

    fn message(err: AppError) -> String {
        err.to_string()
    }

    #[test]
    fn test_rows_become_clips() {
        let csv = "text,name,filename\nHello {name},Ada,greet_{name}\nBye {name},Bob,\n";
        let sheet = parse_bulk_csv(csv.as_bytes(), &limits()).unwrap();
        let clips = plan_clips(&sheet, &limits()).unwrap();

        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].text, "Hello Ada");
        assert_eq!(clips[0].file_name.as_str(), "greet_Ada.mp3");
        assert_eq!(clips[1].text, "Bye Bob");
        assert_eq!(clips[1].file_name.as_str(), "audio_1.mp3");
    }

    #[test]
    fn test_duplicate_filenames_get_suffixes() {
        let csv = "text,filename\na,clip\nb,clip\nc,clip.mp3\n";
        let sheet = parse_bulk_csv(csv.as_bytes(), &limits()).unwrap();
        let names: Vec<String> = plan_clips(&sheet, &limits())
            .unwrap()
            .into_iter()
            .map(|c| c.file_name.to_string())
            .collect();
        assert_eq!(names, vec!["clip.mp3", "clip_2.mp3", "clip_3.mp3"]);
    }

    #[test]
    fn test_row_filename_cannot_escape() {
        let csv = "text,filename\nhi,../../etc/passwd\n";
        let sheet = parse_bulk_csv(csv.as_bytes(), &limits()).unwrap();
        let clips = plan_clips(&sheet, &limits()).unwrap();
        assert!(!clips[0].file_name.as_str().contains('/'));
        assert!(clips[0].file_name.as_str().ends_with(".mp3"));
    }

    #[test]
    fn test_literal_newlines_are_expanded() {
        let csv = "text\nline one\\nline two\n";
        let sheet = parse_bulk_csv(csv.as_bytes(), &limits()).unwrap();
        let clips = plan_clips(&sheet, &limits()).unwrap();
        assert_eq!(clips[0].text, "line one\nline two");
    }

    #[test]
    fn test_missing_text_column() {
        let err = parse_bulk_csv(b"script\nhello\n", &limits()).unwrap_err();
        assert_eq!(message(err), "CSV file must contain a 'text' column");
    }

    #[test]
    fn test_invalid_column_names_listed() {
        let err = parse_bulk_csv(b"text,first-name,last name\na,b,c\n", &limits()).unwrap_err();
        assert_eq!(
            message(err),
            "Invalid column names detected: first-name, last name"
        );
    }

    #[test]
    fn test_too_many_rows() {
        let limits = ResourceLimits {
            max_rows: 2,
            ..limits()
        };
        let err = parse_bulk_csv(b"text\na\nb\nc\n", &limits).unwrap_err();
        assert!(message(err).starts_with("CSV file contains 3 rows"));
    }

    #[test]
    fn test_oversized_upload() {
        let limits = ResourceLimits {
            max_upload_bytes: 8,
            ..limits()
        };
        let err = parse_bulk_csv(b"text\nhello world\n", &limits).unwrap_err();
        assert!(message(err).starts_with("File size"));
    }

    #[test]
    fn test_variable_without_column() {
        let csv = "text\nHello {name}\n";
        let sheet = parse_bulk_csv(csv.as_bytes(), &limits()).unwrap();
        let err = plan_clips(&sheet, &limits()).unwrap_err();
        assert!(message(err).contains("no 'name' column"));
    }

    #[test]
    fn test_substituted_text_too_long() {
        let limits = ResourceLimits {
            max_text_chars: 10,
            ..limits()
        };
        let csv = "text,who\nHello {who},Bartholomew\n";
        let sheet = parse_bulk_csv(csv.as_bytes(), &limits).unwrap();
        let err = plan_clips(&sheet, &limits).unwrap_err();
        assert!(message(err).starts_with("Row 1 text is 17 characters"));
    }
}

#[cfg(test)]
mod model_tests {
    use eleventools_server::services::elevenlabs::VoiceSettings;
    use eleventools_server::services::model_capabilities::model_capabilities;

    #[test]
    fn test_v3_capabilities() {
        let caps = model_capabilities("eleven_v3");
        assert!(caps.speed);
        assert!(caps.audio_tags);
        assert!(!model_capabilities("eleven_monolingual_v1").speed);
    }

    #[test]
    fn test_voice_settings_defaults_from_partial_json() {
        let settings: VoiceSettings = serde_json::from_str(r#"{"stability": 0.8}"#).unwrap();
        assert_eq!(settings.stability, 0.8);
        assert_eq!(settings.similarity_boost, 0.5);
        assert_eq!(settings.speed, None);
    }
}
