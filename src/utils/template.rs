//! Template parsing for user-authored scripts.
//!
//! Two placeholder syntaxes are recognised:
//! - `{name}`: a variable substituted per run or per CSV row
//! - `[[language:word]]`: a word to be replaced by its phonetic spelling
//!
//! Parsing is best-effort. Malformed spans are simply not matched.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};
use serde::Serialize;

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("valid variable regex"));

static PHONETIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^:]+):([^\]]+)\]\]").expect("valid phonetic regex"));

/// A `[[language:word]]` span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PhoneticDirective {
    pub language: String,
    pub word: String,
}

impl PhoneticDirective {
    pub fn new(language: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            word: word.into(),
        }
    }
}

/// Variable names referenced as `{name}`, left to right, repeats included.
pub fn find_variables(text: &str) -> Vec<String> {
    VARIABLE_RE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Variable names in order of first appearance, without repeats.
///
/// Substitution asks for one value per distinct name and applies it to every
/// occurrence.
pub fn unique_variables(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for name in find_variables(text) {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// `[[language:word]]` directives, left to right.
pub fn find_phonetic_directives(text: &str) -> Vec<PhoneticDirective> {
    PHONETIC_RE
        .captures_iter(text)
        .map(|caps| PhoneticDirective::new(&caps[1], &caps[2]))
        .collect()
}

/// Turn escaped `\n` sequences (as stored in single CSV cells) into newlines.
pub fn normalize_literal_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Replace `{name}` placeholders that have a value. Unknown names stay as-is.
pub fn substitute_variables(text: &str, values: &HashMap<String, String>) -> String {
    VARIABLE_RE
        .replace_all(text, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Replace `[[language:word]]` spans with their converted spelling.
/// Spans without a conversion stay as-is.
pub fn substitute_phonetic_directives(
    text: &str,
    conversions: &HashMap<PhoneticDirective, String>,
) -> String {
    PHONETIC_RE
        .replace_all(text, |caps: &Captures| {
            let key = PhoneticDirective::new(&caps[1], &caps[2]);
            match conversions.get(&key) {
                Some(spelling) => spelling.clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_keep_order_and_repeats() {
        assert_eq!(
            find_variables("Hello {name}, {name} again, {place}!"),
            vec!["name", "name", "place"]
        );
    }

    #[test]
    fn test_unique_variables() {
        assert_eq!(
            unique_variables("Hello {name}, {name} again, {place}!"),
            vec!["name", "place"]
        );
    }

    #[test]
    fn test_malformed_braces_ignored() {
        assert!(find_variables("{name").is_empty());
        assert!(find_variables("{}").is_empty());
        assert!(find_variables("").is_empty());
        // No nesting: the first `}` closes the span.
        assert_eq!(find_variables("{a{b}c}"), vec!["a{b"]);
    }

    #[test]
    fn test_phonetic_directives() {
        assert_eq!(
            find_phonetic_directives("Say [[english:hello]] and [[french:bonjour]]"),
            vec![
                PhoneticDirective::new("english", "hello"),
                PhoneticDirective::new("french", "bonjour"),
            ]
        );
        assert!(find_phonetic_directives("no directives here").is_empty());
        assert!(find_phonetic_directives("[[hello]]").is_empty());
    }

    #[test]
    fn test_newline_normalization() {
        assert_eq!(normalize_literal_newlines("a\\nb"), "a\nb");
        assert_eq!(normalize_literal_newlines("plain"), "plain");
    }

    #[test]
    fn test_substitute_leaves_unknown() {
        let values = HashMap::from([("name".to_string(), "Alice".to_string())]);
        assert_eq!(
            substitute_variables("Hi {name}, {name}! From {place}", &values),
            "Hi Alice, Alice! From {place}"
        );
    }

    #[test]
    fn test_substitute_phonetics() {
        let conversions = HashMap::from([(
            PhoneticDirective::new("french", "bonjour"),
            "bohn-ZHOOR".to_string(),
        )]);
        assert_eq!(
            substitute_phonetic_directives("Say [[french:bonjour]] [[german:hallo]]", &conversions),
            "Say bohn-ZHOOR [[german:hallo]]"
        );
    }
}
