//! Zip bundling for multi-file results.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use pdfdesk_core::error::{AppError, ErrorKind};
use pdfdesk_core::result::AppResult;

/// Where the bytes of an entry come from.
#[derive(Debug, Clone)]
pub enum ArchiveSource {
    /// Copy a file from disk.
    File(PathBuf),
    /// Write an in-memory buffer.
    Bytes(Vec<u8>),
}

/// One member of a bundle.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Name inside the archive.
    pub name: String,
    /// Content.
    pub source: ArchiveSource,
}

impl ArchiveEntry {
    /// Entry backed by a file.
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: ArchiveSource::File(path.into()),
        }
    }

    /// Entry backed by a buffer.
    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: ArchiveSource::Bytes(bytes),
        }
    }
}

/// Write `entries` to a new zip at `dest`, returning the archive size.
///
/// Blocking; call from `spawn_blocking`.
pub fn write_zip(dest: &Path, entries: &[ArchiveEntry]) -> AppResult<u64> {
    let file = File::create(dest).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to create archive: {}", dest.display()),
            e,
        )
    })?;

    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        zip.start_file(entry.name.as_str(), options).map_err(zip_error)?;
        match &entry.source {
            ArchiveSource::Bytes(bytes) => zip.write_all(bytes)?,
            ArchiveSource::File(path) => {
                let mut input = File::open(path).map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to open archive member: {}", path.display()),
                        e,
                    )
                })?;
                io::copy(&mut input, &mut zip)?;
            }
        }
    }

    let file = zip.finish().map_err(zip_error)?;
    let size = file.metadata()?.len();
    Ok(size)
}

fn zip_error(err: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Storage, format!("ZIP error: {err}"), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_bundle_preserves_entry_order_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = dir.path().join("second.bin");
        std::fs::write(&on_disk, b"from disk").unwrap();
        let dest = dir.path().join("bundle.zip");

        let size = write_zip(
            &dest,
            &[
                ArchiveEntry::bytes("page_1.pdf", b"first".to_vec()),
                ArchiveEntry::file("page_2.pdf", &on_disk),
            ],
        )
        .unwrap();
        assert_eq!(size, std::fs::metadata(&dest).unwrap().len());

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.by_index(0).unwrap().name(), "page_1.pdf");

        let mut content = String::new();
        archive
            .by_name("page_2.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "from disk");
    }

    #[test]
    fn test_missing_member_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_zip(
            &dir.path().join("bundle.zip"),
            &[ArchiveEntry::file("x.pdf", dir.path().join("absent.pdf"))],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
