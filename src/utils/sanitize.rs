//! Path and filename sanitization.
//!
//! Everything that ends up as a segment of an on-disk path (CSV names, row
//! filenames, session ids, voice names) goes through here first. The
//! containment check in [`validate_path_within_base`] is a second line and
//! is applied to the joined path right before any write.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

pub const DEFAULT_MAX_LENGTH: usize = 100;

const FALLBACK: &str = "default";

/// Characters that are path separators or reserved on common filesystems.
fn is_forbidden(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_ascii_control()
}

fn is_edge_junk(c: char) -> bool {
    c == '.' || c.is_whitespace()
}

fn replace_forbidden(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn fallback(max_length: usize) -> String {
    truncate_chars(FALLBACK, max_length).to_string()
}

/// Make an arbitrary string safe to use as a single path segment.
///
/// The result never contains a separator, is never `.` or `..`, is never
/// empty and is at most `max_length` characters long (a `max_length` of 0
/// is treated as 1).
pub fn sanitize_path_component(raw: &str, max_length: usize) -> String {
    let max_length = max_length.max(1);
    let replaced = replace_forbidden(raw);
    let trimmed = replaced.trim_matches(is_edge_junk);
    let truncated = truncate_chars(trimmed, max_length).trim_end_matches(is_edge_junk);

    if truncated.is_empty() || truncated == "." || truncated == ".." {
        return fallback(max_length);
    }
    truncated.to_string()
}

/// Like [`sanitize_path_component`], but truncation keeps the extension.
pub fn sanitize_filename(raw: &str, max_length: usize) -> String {
    let once = sanitize_filename_once(raw, max_length);
    // Cutting through an oversized extension can expose a shorter one.
    sanitize_filename_once(&once, max_length)
}

fn sanitize_filename_once(raw: &str, max_length: usize) -> String {
    let max_length = max_length.max(1);
    let replaced = replace_forbidden(raw);
    let trimmed = replaced.trim_matches(is_edge_junk);

    let sanitized = match trimmed.rfind('.') {
        Some(dot) if dot > 0 => {
            let (stem, ext) = trimmed.split_at(dot);
            let ext_len = ext.chars().count();
            if ext_len < max_length {
                let stem = truncate_chars(stem, max_length - ext_len).trim_end_matches(is_edge_junk);
                let stem = if stem.is_empty() {
                    fallback(max_length - ext_len)
                } else {
                    stem.to_string()
                };
                format!("{}{}", stem, ext)
            } else {
                truncate_chars(trimmed, max_length)
                    .trim_end_matches(is_edge_junk)
                    .to_string()
            }
        }
        _ => truncate_chars(trimmed, max_length)
            .trim_end_matches(is_edge_junk)
            .to_string(),
    };

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return fallback(max_length);
    }
    sanitized
}

/// Lexically resolve `path` to an absolute path without touching the disk.
fn normalize(path: &Path) -> Option<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
        }
    }
    Some(out)
}

/// True iff `candidate` resolves to `base` or somewhere below it.
///
/// Comparison is component-wise, so `/srv/outputs-evil` is not inside
/// `/srv/outputs`.
pub fn validate_path_within_base(candidate: impl AsRef<Path>, base: impl AsRef<Path>) -> bool {
    match (normalize(candidate.as_ref()), normalize(base.as_ref())) {
        (Some(candidate), Some(base)) => candidate.starts_with(&base),
        _ => false,
    }
}

/// Escape HTML special characters in user text echoed back to the page.
pub fn escape_html_content(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A path segment that has been through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PathComponent(String);

impl PathComponent {
    pub fn sanitize(raw: &str, max_length: usize) -> Self {
        Self(sanitize_path_component(raw, max_length))
    }

    pub fn filename(raw: &str, max_length: usize) -> Self {
        Self(sanitize_filename(raw, max_length))
    }

    /// Accept `raw` only if sanitizing leaves it unchanged.
    ///
    /// Used for names coming back from the browser (file explorer paths):
    /// anything the sanitizer would have rewritten cannot name a file we wrote.
    pub fn exact(raw: &str, max_length: usize) -> Option<Self> {
        let clean = sanitize_filename(raw, max_length);
        (clean == raw).then_some(Self(clean))
    }

    /// [`PathComponent::exact`] for directory names made by [`PathComponent::sanitize`].
    pub fn exact_component(raw: &str, max_length: usize) -> Option<Self> {
        let clean = sanitize_path_component(raw, max_length);
        (clean == raw).then_some(Self(clean))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for PathComponent {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
