//! Per-browser-session output isolation.
//!
//! Every browser session gets an opaque id (UUID v4, carried in a cookie) and
//! a private subtree of the shared outputs directory:
//!
//! ```text
//! outputs/<session-id>/single/
//! outputs/<session-id>/bulk/<csv-name>/
//! ```
//!
//! Abandoned subtrees are reclaimed by [`cleanup::cleanup_old_sessions`].

pub mod cleanup;
pub mod context;
pub mod cookie;
pub mod registry;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

pub use context::SessionContext;
pub use registry::{SessionRegistry, SessionSettings};

/// Opaque identifier minted once per browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id coming back from the browser. Anything that is not a UUID
    /// is refused, so a forged cookie can never name a path.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// The process-configured outputs directory. Never built from user input.
#[derive(Debug, Clone)]
pub struct OutputRoot(Arc<PathBuf>);

impl OutputRoot {
    /// Relative roots are anchored at the current directory so containment
    /// checks compare like with like.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&path))
                .unwrap_or(path)
        };
        Self(Arc::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for OutputRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
