//! Artifact handles.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use pdfdesk_core::error::{AppError, ErrorKind};
use pdfdesk_core::result::AppResult;

/// Generate a collision-free artifact file name.
pub fn artifact_name(extension: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension)
}

/// Lower-cased extension of `file_name` including the dot, or `""`.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Base name of `file_name` without directories or extension.
pub fn stem_of(file_name: &str) -> String {
    // Browsers on Windows may send full paths.
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    Path::new(base)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("document")
        .to_string()
}

/// An uploaded file living in `uploads/`.
///
/// The file is removed when the handle is dropped, so an input never
/// outlives the job that received it, whichever way the job ends.
#[derive(Debug)]
pub struct InputArtifact {
    path: PathBuf,
    original_name: String,
    extension: String,
    size: u64,
}

impl InputArtifact {
    /// Path of the stored upload.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as sent by the client.
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Lower-cased extension including the dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Client file name without extension.
    pub fn stem(&self) -> String {
        stem_of(&self.original_name)
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the whole upload.
    pub async fn read(&self) -> AppResult<Vec<u8>> {
        fs::read(&self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read upload '{}'", self.original_name),
                e,
            )
        })
    }
}

impl Drop for InputArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed input artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove input artifact"
            ),
        }
    }
}

/// Streams one upload to disk while enforcing the byte limit.
///
/// Dropping the writer before [`InputWriter::finish`] removes the partial
/// file.
#[derive(Debug)]
pub struct InputWriter {
    artifact: InputArtifact,
    file: fs::File,
    max_bytes: u64,
}

impl InputWriter {
    pub(crate) async fn create(
        dir: &Path,
        original_name: &str,
        max_bytes: u64,
    ) -> AppResult<Self> {
        let extension = extension_of(original_name);
        let path = dir.join(artifact_name(&extension));
        let file = fs::File::create(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create upload file: {}", path.display()),
                e,
            )
        })?;

        Ok(Self {
            artifact: InputArtifact {
                path,
                original_name: original_name.to_string(),
                extension,
                size: 0,
            },
            file,
            max_bytes,
        })
    }

    /// Append a chunk.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> AppResult<()> {
        let size = self.artifact.size + chunk.len() as u64;
        if size > self.max_bytes {
            return Err(AppError::payload_too_large(format!(
                "File '{}' exceeds the {} MB limit",
                self.artifact.original_name,
                self.max_bytes / (1024 * 1024)
            )));
        }
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to write upload chunk", e))?;
        self.artifact.size = size;
        Ok(())
    }

    /// Flush and hand over the stored artifact.
    pub async fn finish(mut self) -> AppResult<InputArtifact> {
        self.file
            .flush()
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush upload", e))?;
        tracing::debug!(
            path = %self.artifact.path.display(),
            bytes = self.artifact.size,
            "Stored input artifact"
        );
        Ok(self.artifact)
    }
}

/// A result file living in `outputs/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    /// Absolute or data-root relative path.
    pub path: PathBuf,
    /// File name under `/outputs`.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl OutputArtifact {
    /// Extension including the dot.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

/// Per-job scratch directory, removed recursively on drop. Inside a Tokio
/// runtime the removal runs on the blocking pool.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub(crate) async fn create(parent: &Path) -> AppResult<Self> {
        let path = parent.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create work directory: {}", path.display()),
                e,
            )
        })?;
        Ok(Self { path })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_work_dir(&path));
            }
            Err(_) => remove_work_dir(&path),
        }
    }
}

fn remove_work_dir(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove work directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_lower_cased_with_dot() {
        assert_eq!(extension_of("Report.PDF"), ".pdf");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
    }

    #[test]
    fn test_stem_strips_directories_and_extension() {
        assert_eq!(stem_of("invoice.pdf"), "invoice");
        assert_eq!(stem_of(r"C:\Users\me\scan.final.pdf"), "scan.final");
        assert_eq!(stem_of("a/b/c.docx"), "c");
        assert_eq!(stem_of(".pdf"), ".pdf");
    }

    #[test]
    fn test_artifact_names_are_unique() {
        let a = artifact_name(".pdf");
        let b = artifact_name(".pdf");
        assert_ne!(a, b);
        assert!(a.ends_with(".pdf"));
        assert_eq!(a.len(), 36 + 4);
    }

    #[tokio::test]
    async fn test_writer_rejects_oversize_and_removes_partial() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = InputWriter::create(dir.path(), "big.pdf", 8).await.unwrap();
        writer.write_chunk(b"12345").await.unwrap();
        let err = writer.write_chunk(b"67890").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::PayloadTooLarge);

        drop(writer);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_input_artifact_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = InputWriter::create(dir.path(), "doc.PDF", 1024).await.unwrap();
        writer.write_chunk(b"%PDF-1.4").await.unwrap();
        let artifact = writer.finish().await.unwrap();

        assert_eq!(artifact.size(), 8);
        assert_eq!(artifact.extension(), ".pdf");
        assert_eq!(artifact.stem(), "doc");
        let path = artifact.path().to_path_buf();
        assert_eq!(artifact.read().await.unwrap(), b"%PDF-1.4");
        assert!(path.exists());

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_work_dir_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let work = WorkDir::create(dir.path()).await.unwrap();
        std::fs::write(work.path().join("page_001.jpg"), b"x").unwrap();
        let path = work.path().to_path_buf();

        drop(work);
        for _ in 0..100 {
            if !path.exists() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_work_dir_removed_on_drop_outside_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("out.docx"), b"x").unwrap();

        drop(WorkDir { path: path.clone() });
        assert!(!path.exists());
    }
}
