//! Retention sweeper: removes artifacts older than the retention window.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use pdfdesk_core::config::StorageConfig;
use pdfdesk_core::error::{AppError, ErrorKind};
use pdfdesk_storage::ArtifactStore;

/// Sweep failures. Per-entry problems are logged and counted instead.
#[derive(Debug, Error)]
pub enum SweepError {
    /// A previous sweep has not finished yet.
    #[error("A sweep is already running")]
    AlreadyRunning,

    /// A sweep root exists but is not a directory.
    #[error("Sweep root is not a directory: {0}")]
    InvalidRoot(PathBuf),
}

impl From<SweepError> for AppError {
    fn from(err: SweepError) -> Self {
        let message = err.to_string();
        AppError::with_source(ErrorKind::Storage, message, err)
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Entries looked at.
    pub scanned: usize,
    /// Entries deleted.
    pub removed: usize,
    /// Entries that could not be inspected or deleted.
    pub failed: usize,
}

/// Deletes entries of the artifact directories whose modification time is
/// older than the retention window.
///
/// At most one sweep runs at a time; a sweep requested while another is in
/// progress is skipped.
#[derive(Debug)]
pub struct RetentionSweeper {
    roots: Vec<PathBuf>,
    retention: Duration,
    running: AtomicBool,
}

/// Clears the running flag when the sweep ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RetentionSweeper {
    /// Create a sweeper over explicit directories.
    pub fn new(roots: Vec<PathBuf>, retention: Duration) -> Self {
        Self {
            roots,
            retention,
            running: AtomicBool::new(false),
        }
    }

    /// Sweep the store's directories with the configured retention.
    pub fn for_store(store: &ArtifactStore, config: &StorageConfig) -> Self {
        let hours = i64::try_from(config.retention_hours).unwrap_or(i64::MAX / 3600);
        Self::new(store.sweep_roots(), Duration::hours(hours))
    }

    /// Retention window.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Whether a sweep is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Sweep now.
    pub async fn sweep(&self) -> Result<SweepReport, SweepError> {
        self.sweep_at(Utc::now()).await
    }

    /// Sweep as if the current time were `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, SweepError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Sweep already running, skipping");
            return Err(SweepError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let cutoff = now - self.retention;
        let mut report = SweepReport::default();

        for root in &self.roots {
            self.sweep_root(root, cutoff, &mut report).await?;
        }

        tracing::info!(
            scanned = report.scanned,
            removed = report.removed,
            failed = report.failed,
            "Retention sweep finished"
        );
        Ok(report)
    }

    async fn sweep_root(
        &self,
        root: &Path,
        cutoff: DateTime<Utc>,
        report: &mut SweepReport,
    ) -> Result<(), SweepError> {
        let mut entries = match tokio::fs::read_dir(root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(_) if root.exists() && !root.is_dir() => {
                return Err(SweepError::InvalidRoot(root.to_path_buf()));
            }
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Failed to read sweep root");
                report.failed += 1;
                return Ok(());
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "Failed to list sweep root");
                    report.failed += 1;
                    break;
                }
            };
            report.scanned += 1;

            let path = entry.path();
            let stat = entry
                .metadata()
                .await
                .and_then(|m| m.modified().map(|t| (m, t)));
            let (metadata, modified) = match stat {
                Ok((metadata, modified)) => (metadata, DateTime::<Utc>::from(modified)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to stat entry");
                    report.failed += 1;
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            let result = if metadata.is_dir() {
                tokio::fs::remove_dir_all(&path).await
            } else {
                tokio::fs::remove_file(&path).await
            };
            match result {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "Removed expired artifact");
                    report.removed += 1;
                }
                // Deleted concurrently by a request or an explicit delete.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired artifact");
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }
}
