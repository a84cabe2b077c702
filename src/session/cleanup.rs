use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;

use crate::session::{OutputRoot, SessionRegistry};

/// Top-level directories from the layout that predates per-session folders.
/// The sweep never touches them.
pub const LEGACY_DIRS: [&str; 2] = ["single", "bulk"];

/// Remove session directories under `root` untouched for more than
/// `max_age_hours`. Returns how many were removed.
pub async fn cleanup_old_sessions(root: &Path, max_age_hours: u64) -> usize {
    cleanup_sessions_older_than(
        root,
        Duration::from_secs(max_age_hours.saturating_mul(3600)),
        SystemTime::now(),
    )
    .await
}

/// Same sweep with an explicit clock.
///
/// `root` must be the process-configured outputs directory; everything
/// beneath it that is not a legacy folder is treated as a session subtree.
/// Errors on a single entry are logged and skipped.
pub async fn cleanup_sessions_older_than(root: &Path, max_age: Duration, now: SystemTime) -> usize {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Outputs directory does not exist, skipping cleanup");
            return 0;
        }
        Err(e) => {
            tracing::error!("Could not list outputs directory {}: {}", root.display(), e);
            return 0;
        }
    };

    tracing::info!(
        "Starting cleanup of session directories older than {:.1} hours",
        max_age.as_secs_f64() / 3600.0
    );

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Error while listing session directories: {}", e);
                break;
            }
        };

        let name = entry.file_name();
        let name = name.to_string_lossy();
        if LEGACY_DIRS.contains(&name.as_ref()) {
            continue;
        }

        match sweep_entry(&entry.path(), max_age, now).await {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("Could not access session directory {}: {}", name, e),
        }
    }

    if removed > 0 {
        tracing::info!("Cleanup completed: removed {} old session directories", removed);
    } else {
        tracing::debug!("Cleanup completed: no old session directories found");
    }
    removed
}

async fn sweep_entry(path: &Path, max_age: Duration, now: SystemTime) -> std::io::Result<bool> {
    // symlink_metadata: a link planted under the root is never followed.
    let meta = tokio::fs::symlink_metadata(path).await?;
    if !meta.is_dir() {
        return Ok(false);
    }

    let age = now
        .duration_since(meta.modified()?)
        .unwrap_or(Duration::ZERO);
    let age_hours = age.as_secs_f64() / 3600.0;

    if age > max_age {
        tracing::info!(
            "Removing old session directory: {} (age: {:.1} hours)",
            path.display(),
            age_hours
        );
        tokio::fs::remove_dir_all(path).await?;
        Ok(true)
    } else {
        tracing::debug!(
            "Preserving session directory: {} (age: {:.1} hours)",
            path.display(),
            age_hours
        );
        Ok(false)
    }
}

/// Run the sweep now and then every `interval` until the returned sender
/// is set to `true`. Also forgets in-memory settings of idle sessions.
pub fn spawn_cleanup_task(
    root: OutputRoot,
    registry: SessionRegistry,
    max_age: Duration,
    interval: Duration,
) -> watch::Sender<bool> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let removed = cleanup_sessions_older_than(root.path(), max_age, SystemTime::now()).await;
                    let forgotten = registry.forget_idle(max_age);
                    if removed > 0 || forgotten > 0 {
                        tracing::info!(
                            "Session sweep: removed {} directories, forgot {} idle sessions",
                            removed,
                            forgotten
                        );
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Session cleanup task shutting down");
                        break;
                    }
                }
            }
        }
    });

    shutdown_tx
}
