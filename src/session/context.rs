use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::AppError;
use crate::session::{OutputRoot, SessionId};
use crate::utils::limits::MAX_FILENAME_LENGTH;
use crate::utils::sanitize::{validate_path_within_base, PathComponent};

pub const SINGLE_DIR: &str = "single";
pub const BULK_DIR: &str = "bulk";

/// One browser session's view of the outputs directory.
///
/// The id is minted lazily on first use and then stays fixed. Directories
/// are created on demand; asking again for an existing one is a no-op.
#[derive(Debug, Clone)]
pub struct SessionContext {
    root: OutputRoot,
    session_id: Option<SessionId>,
}

impl SessionContext {
    pub fn new(root: OutputRoot) -> Self {
        Self {
            root,
            session_id: None,
        }
    }

    /// Rebuild the context for a session whose id arrived in a cookie.
    pub fn resume(root: OutputRoot, session_id: SessionId) -> Self {
        Self {
            root,
            session_id: Some(session_id),
        }
    }

    pub fn root(&self) -> &OutputRoot {
        &self.root
    }

    pub fn session_id(&mut self) -> SessionId {
        *self.session_id.get_or_insert_with(|| {
            let id = SessionId::new();
            tracing::debug!("Minted session id {}", id);
            id
        })
    }

    /// `outputs/<session_id>` without creating anything.
    pub fn session_path(&mut self) -> PathBuf {
        let id = PathComponent::sanitize(&self.session_id().to_string(), MAX_FILENAME_LENGTH);
        self.root.path().join(id)
    }

    pub fn single_path(&mut self) -> PathBuf {
        self.session_path().join(SINGLE_DIR)
    }

    pub fn bulk_path(&mut self) -> PathBuf {
        self.session_path().join(BULK_DIR)
    }

    async fn ensure_dir(&self, dir: PathBuf) -> Result<PathBuf, AppError> {
        if !validate_path_within_base(&dir, self.root.path()) {
            return Err(AppError::PathEscape(dir.display().to_string()));
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    pub async fn output_dir(&mut self) -> Result<PathBuf, AppError> {
        let dir = self.session_path();
        self.ensure_dir(dir).await
    }

    pub async fn single_dir(&mut self) -> Result<PathBuf, AppError> {
        let dir = self.single_path();
        self.ensure_dir(dir).await
    }

    /// `name` must already be sanitized, which the type guarantees.
    pub async fn bulk_dir(&mut self, name: &PathComponent) -> Result<PathBuf, AppError> {
        let dir = self.bulk_path().join(name);
        self.ensure_dir(dir).await
    }

    /// Write generated audio into one of this session's directories.
    ///
    /// The joined path is checked against the session subtree before the
    /// write; a failed check aborts. The session directory's mtime is bumped
    /// afterwards so the sweep sees the session as recently active.
    pub async fn write_artifact(
        &mut self,
        dir: &Path,
        file_name: &PathComponent,
        bytes: &[u8],
    ) -> Result<PathBuf, AppError> {
        let session_dir = self.session_path();
        let path = dir.join(file_name);
        if !validate_path_within_base(&path, &session_dir) {
            return Err(AppError::PathEscape(path.display().to_string()));
        }

        tokio::fs::write(&path, bytes).await?;
        tracing::info!("Wrote {} bytes to {}", bytes.len(), path.display());

        if let Err(e) = touch_dir(&session_dir).await {
            tracing::warn!("Could not refresh mtime of {}: {}", session_dir.display(), e);
        }
        Ok(path)
    }
}

async fn touch_dir(dir: &Path) -> std::io::Result<()> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::File::open(&dir)?.set_modified(SystemTime::now())
    })
    .await
    .map_err(std::io::Error::other)?
}
