//! The artifact store.

use std::path::{Path, PathBuf};

use tokio::fs;

use pdfdesk_core::config::StorageConfig;
use pdfdesk_core::error::{AppError, ErrorKind};
use pdfdesk_core::result::AppResult;

use crate::archive::{self, ArchiveEntry};
use crate::artifact::{InputWriter, OutputArtifact, WorkDir, artifact_name};

/// Owns the three artifact directories.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    uploads: PathBuf,
    outputs: PathBuf,
    work: PathBuf,
}

impl ArtifactStore {
    /// Create the directories if needed and open the store.
    pub async fn open(config: &StorageConfig) -> AppResult<Self> {
        let store = Self {
            uploads: config.uploads_dir(),
            outputs: config.outputs_dir(),
            work: config.work_dir(),
        };

        for dir in [&store.uploads, &store.outputs, &store.work] {
            fs::create_dir_all(dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create directory '{}'", dir.display()),
                    e,
                )
            })?;
        }

        tracing::info!(
            uploads = %store.uploads.display(),
            outputs = %store.outputs.display(),
            "Artifact store ready"
        );
        Ok(store)
    }

    /// Input directory.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    /// Output directory, served under `/outputs`.
    pub fn outputs_dir(&self) -> &Path {
        &self.outputs
    }

    /// Scratch directory root.
    pub fn work_dir(&self) -> &Path {
        &self.work
    }

    /// Directories the retention sweeper walks.
    pub fn sweep_roots(&self) -> Vec<PathBuf> {
        vec![self.uploads.clone(), self.outputs.clone(), self.work.clone()]
    }

    /// Start streaming an upload into `uploads/`.
    pub async fn begin_input(&self, original_name: &str, max_bytes: u64) -> AppResult<InputWriter> {
        InputWriter::create(&self.uploads, original_name, max_bytes).await
    }

    /// Create a scratch directory for one job.
    pub async fn create_work_dir(&self) -> AppResult<WorkDir> {
        WorkDir::create(&self.work).await
    }

    /// Persist a buffer as a new output artifact.
    pub async fn write_output(&self, extension: &str, bytes: &[u8]) -> AppResult<OutputArtifact> {
        let name = artifact_name(extension);
        let path = self.outputs.join(&name);
        fs::write(&path, bytes).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write output '{name}'"),
                e,
            )
        })?;

        tracing::debug!(name = %name, bytes = bytes.len(), "Wrote output artifact");
        Ok(OutputArtifact {
            path,
            name,
            size: bytes.len() as u64,
        })
    }

    /// Move a file produced elsewhere (usually a work dir) into `outputs/`.
    pub async fn adopt_output(&self, source: &Path, extension: &str) -> AppResult<OutputArtifact> {
        let name = artifact_name(extension);
        let path = self.outputs.join(&name);

        if fs::rename(source, &path).await.is_err() {
            // Different filesystem: fall back to copy + delete.
            fs::copy(source, &path).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to move '{}' into outputs", source.display()),
                    e,
                )
            })?;
            remove_if_exists(source).await?;
        }

        let size = fs::metadata(&path).await?.len();
        Ok(OutputArtifact { path, name, size })
    }

    /// Bundle several results into one zip output.
    pub async fn bundle_outputs(&self, entries: Vec<ArchiveEntry>) -> AppResult<OutputArtifact> {
        let name = artifact_name(".zip");
        let path = self.outputs.join(&name);
        let dest = path.clone();
        let count = entries.len();

        let size = tokio::task::spawn_blocking(move || archive::write_zip(&dest, &entries))
            .await
            .map_err(|e| AppError::internal(format!("Archive task failed: {e}")))??;

        tracing::debug!(name = %name, entries = count, bytes = size, "Wrote output bundle");
        Ok(OutputArtifact { path, name, size })
    }

    /// Resolve a public output name to its path.
    pub fn resolve_output(&self, name: &str) -> AppResult<PathBuf> {
        if !is_artifact_name(name) {
            return Err(AppError::invalid_input(format!("Invalid output name '{name}'")));
        }
        Ok(self.outputs.join(name))
    }

    /// Delete an output. Returns whether a file was removed.
    pub async fn delete_output(&self, name: &str) -> AppResult<bool> {
        let path = self.resolve_output(name)?;
        let removed = remove_if_exists(&path).await?;
        if removed {
            tracing::info!(name = %name, "Deleted output artifact");
        }
        Ok(removed)
    }
}

/// Delete a file if it exists. Returns whether it existed.
pub async fn remove_if_exists(path: &Path) -> AppResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to delete '{}'", path.display()),
            e,
        )),
    }
}

/// Output names are single path components made of safe characters.
fn is_artifact_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 128
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store(dir: &Path) -> ArtifactStore {
        let config = StorageConfig {
            data_root: dir.to_string_lossy().to_string(),
            ..StorageConfig::default()
        };
        ArtifactStore::open(&config).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        assert!(store.uploads_dir().is_dir());
        assert!(store.outputs_dir().is_dir());
        assert!(store.work_dir().is_dir());
        assert_eq!(store.sweep_roots().len(), 3);
    }

    #[tokio::test]
    async fn test_write_output_reports_size_and_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;

        let a = store.write_output(".pdf", b"same bytes").await.unwrap();
        let b = store.write_output(".pdf", b"same bytes").await.unwrap();
        assert_ne!(a.name, b.name);
        assert_eq!(a.size, 10);
        assert_eq!(std::fs::read(&a.path).unwrap(), std::fs::read(&b.path).unwrap());
        assert_eq!(a.extension(), ".pdf");
    }

    #[tokio::test]
    async fn test_adopt_output_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let work = store.create_work_dir().await.unwrap();
        let produced = work.path().join("report.docx");
        std::fs::write(&produced, b"docx").unwrap();

        let output = store.adopt_output(&produced, ".docx").await.unwrap();
        assert!(!produced.exists());
        assert_eq!(output.size, 4);
        assert!(output.path.starts_with(store.outputs_dir()));
    }

    #[tokio::test]
    async fn test_delete_output_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let output = store.write_output(".pdf", b"x").await.unwrap();

        assert!(store.delete_output(&output.name).await.unwrap());
        assert!(!store.delete_output(&output.name).await.unwrap());
    }

    #[tokio::test]
    async fn test_resolve_output_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        for bad in ["../secret", "a/b.pdf", ".env", "", "x\\y.pdf"] {
            let err = store.resolve_output(bad).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidInput, "{bad}");
        }
        assert!(store.resolve_output("3f1c2a9e-0000-4000-8000-000000000000.zip").is_ok());
    }

    #[tokio::test]
    async fn test_bundle_outputs_writes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path()).await;
        let output = store
            .bundle_outputs(vec![
                ArchiveEntry::bytes("page_1.pdf", b"a".to_vec()),
                ArchiveEntry::bytes("page_2.pdf", b"b".to_vec()),
            ])
            .await
            .unwrap();
        assert!(output.name.ends_with(".zip"));
        assert_eq!(output.size, std::fs::metadata(&output.path).unwrap().len());
    }
}
