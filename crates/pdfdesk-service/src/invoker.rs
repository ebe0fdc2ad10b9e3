//! Transform invoker: runs one job and stores its result.

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::info;

use pdfdesk_convert::{ConversionJob, ConversionKind, Converter};
use pdfdesk_core::error::AppError;
use pdfdesk_core::result::AppResult;
use pdfdesk_document::{merge, organize, repair, security, split, stamp, images};
use pdfdesk_document::{Signature, SplitMode};
use pdfdesk_storage::artifact::extension_of;
use pdfdesk_storage::{ArchiveEntry, ArtifactStore, OutputArtifact};

use crate::job::{Job, JobOutcome};
use crate::options::OperationOptions;

/// Result of an in-process transform before it is stored.
#[derive(Debug)]
struct Rendered {
    /// Client file name of the download.
    filename: String,
    /// One entry per produced document. More than one is zipped.
    files: Vec<(String, Vec<u8>)>,
    extras: Map<String, Value>,
}

impl Rendered {
    fn single(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        Self {
            files: vec![(filename.clone(), bytes)],
            filename,
            extras: Map::new(),
        }
    }
}

/// Dispatches jobs to in-process transforms or to the converter chains.
#[derive(Debug, Clone)]
pub struct TransformInvoker {
    store: ArtifactStore,
    converter: Arc<Converter>,
}

impl TransformInvoker {
    pub fn new(store: ArtifactStore, converter: Arc<Converter>) -> Self {
        Self { store, converter }
    }

    /// The artifact store outputs are written to.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The converter used for external-process operations.
    pub fn converter(&self) -> &Arc<Converter> {
        &self.converter
    }

    /// Run `job` to completion. The job's inputs are deleted before this
    /// returns, whatever the result.
    pub async fn run(&self, job: Job) -> AppResult<JobOutcome> {
        let started = Instant::now();
        let operation = job.operation;

        let result = match conversion_kind(&job.options) {
            Some(kind) => self.convert(&job, kind).await,
            None => self.transform(&job).await,
        };
        drop(job);

        match &result {
            Ok(outcome) => info!(
                operation = %operation,
                output = %outcome.output.name,
                size = outcome.output.size,
                degraded = outcome.note.is_some(),
                duration_ms = started.elapsed().as_millis() as u64,
                "Job completed"
            ),
            Err(e) => info!(
                operation = %operation,
                code = e.kind.code(),
                error = %e.message,
                duration_ms = started.elapsed().as_millis() as u64,
                "Job failed"
            ),
        }
        result
    }

    async fn transform(&self, job: &Job) -> AppResult<JobOutcome> {
        let mut sources = Vec::with_capacity(job.inputs.len());
        for input in &job.inputs {
            sources.push(input.read().await?);
        }
        let stem = job
            .primary()
            .map(|input| input.stem())
            .unwrap_or_else(|| "document".to_string());
        let options = job.options.clone();

        let rendered = tokio::task::spawn_blocking(move || render(&options, sources, &stem))
            .await
            .map_err(|e| AppError::internal(format!("Transform task failed: {e}")))??;

        let output = self.store_rendered(rendered.files).await?;
        let mut outcome = JobOutcome::new(output, rendered.filename);
        outcome.extras = rendered.extras;
        Ok(outcome)
    }

    async fn store_rendered(&self, mut files: Vec<(String, Vec<u8>)>) -> AppResult<OutputArtifact> {
        if files.len() == 1 {
            if let Some((name, bytes)) = files.pop() {
                return self.store.write_output(&extension_of(&name), &bytes).await;
            }
        }
        let entries = files
            .into_iter()
            .map(|(name, bytes)| ArchiveEntry::bytes(name, bytes))
            .collect();
        self.store.bundle_outputs(entries).await
    }

    async fn convert(&self, job: &Job, kind: ConversionKind) -> AppResult<JobOutcome> {
        let work = self.store.create_work_dir().await?;
        let input = job.primary();
        let conversion = ConversionJob {
            kind,
            input: input.map(|i| i.path().to_path_buf()),
            input_name: input
                .map(|i| i.original_name().to_string())
                .unwrap_or_default(),
            work_dir: work.path().to_path_buf(),
        };

        let produced = self.converter.convert(&conversion).await?;
        let page_count = produced.files.len();

        let mut outcome = match produced.files.as_slice() {
            [] => {
                return Err(AppError::processing(format!(
                    "{} conversion produced no output",
                    conversion.kind
                )));
            }
            [file] => {
                let output = self.store.adopt_output(&file.path, &file.extension()).await?;
                let filename = match conversion.kind {
                    ConversionKind::PdfToJpg { .. } => "page_1.jpg".to_string(),
                    ConversionKind::HtmlToPdf { .. } => "webpage.pdf".to_string(),
                    _ => format!("{}{}", conversion.input_stem(), file.extension()),
                };
                JobOutcome::new(output, filename)
            }
            files => {
                let entries = files
                    .iter()
                    .map(|f| ArchiveEntry::file(f.name.clone(), f.path.clone()))
                    .collect();
                let output = self.store.bundle_outputs(entries).await?;
                let filename = match conversion.kind {
                    ConversionKind::PdfToJpg { .. } => "pdf_pages.zip".to_string(),
                    _ => format!("{}.zip", conversion.input_stem()),
                };
                JobOutcome::new(output, filename)
            }
        };

        if matches!(conversion.kind, ConversionKind::PdfToJpg { .. }) {
            outcome = outcome.with_extra("pageCount", page_count);
        }
        // The work dir is removed here, after its files were moved or zipped.
        drop(work);
        Ok(outcome.with_note(produced.note))
    }
}

/// Conversion kind for operations that go through the converter chains.
fn conversion_kind(options: &OperationOptions) -> Option<ConversionKind> {
    let kind = match options {
        OperationOptions::PdfToWord => ConversionKind::PdfToWord,
        OperationOptions::WordToPdf => ConversionKind::WordToPdf,
        OperationOptions::PdfToExcel => ConversionKind::PdfToExcel,
        OperationOptions::ExcelToPdf => ConversionKind::ExcelToPdf,
        OperationOptions::PdfToPpt => ConversionKind::PdfToPpt,
        OperationOptions::PptToPdf => ConversionKind::PptToPdf,
        OperationOptions::PdfToJpg(quality) => ConversionKind::PdfToJpg { quality: *quality },
        OperationOptions::Ocr(ocr) => ConversionKind::Ocr {
            language: ocr.language.clone(),
        },
        OperationOptions::HtmlToPdf(html) => ConversionKind::HtmlToPdf {
            url: html.url.clone(),
        },
        _ => return None,
    };
    Some(kind)
}

/// Run an in-process transform. CPU bound; call from a blocking thread.
fn render(options: &OperationOptions, sources: Vec<Vec<u8>>, stem: &str) -> AppResult<Rendered> {
    let pdf_name = format!("{stem}.pdf");

    if let OperationOptions::Merge = options {
        if sources.len() < 2 {
            return Err(AppError::invalid_input("Please upload at least 2 PDF files"));
        }
        return Ok(Rendered::single("merged.pdf", merge::merge(&sources)?));
    }
    if let OperationOptions::JpgToPdf(page) = options {
        if sources.is_empty() {
            return Err(AppError::invalid_input("Please upload at least one image"));
        }
        return Ok(Rendered::single(
            "images.pdf",
            images::images_to_pdf(&sources, page.page_size)?,
        ));
    }

    let source = sources
        .first()
        .ok_or_else(|| AppError::invalid_input("No file uploaded"))?;

    let rendered = match options {
        OperationOptions::Split(split_options) => split_rendered(source, &split_options.split_mode())?,
        OperationOptions::Compress => {
            let (bytes, report) = repair::compress(source)?;
            let mut rendered = Rendered::single(pdf_name, bytes);
            rendered.extras.insert("originalSize".into(), report.original_size.into());
            rendered.extras.insert("compressedSize".into(), report.compressed_size.into());
            rendered.extras.insert("reduction".into(), report.reduction().into());
            rendered
        }
        OperationOptions::Rotate(rotate) => {
            Rendered::single(pdf_name, organize::rotate(source, rotate.rotation, rotate.pages)?)
        }
        OperationOptions::Watermark(form) => {
            Rendered::single(pdf_name, stamp::watermark(source, &form.to_options())?)
        }
        OperationOptions::Protect(protect) => {
            Rendered::single(pdf_name, security::protect(source, &protect.password)?)
        }
        OperationOptions::Unlock(unlock) => {
            Rendered::single(pdf_name, security::unlock(source, &unlock.password)?)
        }
        OperationOptions::Crop(form) => Rendered::single(pdf_name, organize::crop(source, form.margins())?),
        OperationOptions::PageNumbers(form) => {
            Rendered::single(pdf_name, stamp::page_numbers(source, &form.to_options())?)
        }
        OperationOptions::Organize(form) => {
            Rendered::single(pdf_name, organize::organize(source, &form.to_options())?)
        }
        OperationOptions::Repair => Rendered::single(pdf_name, repair::repair(source)?),
        OperationOptions::Sign(form) => {
            let signature = Signature::from_form(&form.mode, &form.signature)?;
            Rendered::single(pdf_name, stamp::sign(source, &signature)?)
        }
        other => {
            return Err(AppError::internal(format!(
                "Operation {other:?} is not an in-process transform"
            )));
        }
    };
    Ok(rendered)
}

fn split_rendered(source: &[u8], mode: &SplitMode) -> AppResult<Rendered> {
    let mut parts = split::split(source, mode)?;
    if parts.len() == 1 {
        if let Some(part) = parts.pop() {
            return Ok(Rendered::single("split.pdf", part.bytes));
        }
    }
    Ok(Rendered {
        filename: "split_pages.zip".to_string(),
        files: parts
            .into_iter()
            .enumerate()
            .map(|(k, part)| (format!("page_{}.pdf", k + 1), part.bytes))
            .collect(),
        extras: Map::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use pdfdesk_core::config::{ConvertersConfig, StorageConfig, ToolConfig};
    use pdfdesk_core::error::ErrorKind;
    use pdfdesk_core::operation::Operation;
    use pdfdesk_document::pages::{blank_document, page_count, page_sizes};
    use pdfdesk_document::PageSize;
    use pdfdesk_storage::InputArtifact;

    use crate::options::FormFields;

    struct Fixture {
        _root: tempfile::TempDir,
        invoker: TransformInvoker,
    }

    async fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            data_root: root.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let store = ArtifactStore::open(&config).await.unwrap();
        let absent = ToolConfig {
            enabled: false,
            binaries: Vec::new(),
            timeout_seconds: 1,
        };
        let converter = Converter::from_config(&ConvertersConfig {
            libreoffice: absent.clone(),
            ghostscript: absent.clone(),
            chromium: absent.clone(),
            ocrmypdf: absent,
        });
        Fixture {
            _root: root,
            invoker: TransformInvoker::new(store, Arc::new(converter)),
        }
    }

    /// Pages with distinct widths so tests can tell them apart.
    fn pdf(widths: &[f32]) -> Vec<u8> {
        let sizes: Vec<PageSize> = widths.iter().map(|w| PageSize::new(*w, 300.0)).collect();
        blank_document(&sizes).unwrap()
    }

    async fn input(invoker: &TransformInvoker, name: &str, bytes: &[u8]) -> InputArtifact {
        let mut writer = invoker.store().begin_input(name, u64::MAX).await.unwrap();
        writer.write_chunk(bytes).await.unwrap();
        writer.finish().await.unwrap()
    }

    async fn job(
        invoker: &TransformInvoker,
        operation: Operation,
        files: &[(&str, Vec<u8>)],
        fields: &[(&str, &str)],
    ) -> Job {
        let mut inputs = Vec::new();
        for (name, bytes) in files {
            inputs.push(input(invoker, name, bytes).await);
        }
        let mut form = FormFields::default();
        for (key, value) in fields {
            form.insert(*key, *value);
        }
        let options = OperationOptions::parse(operation, &form).unwrap();
        Job::new(operation, inputs, options)
    }

    fn widths(bytes: &[u8]) -> Vec<f32> {
        page_sizes(bytes).unwrap().iter().map(|s| s.width).collect()
    }

    fn zip_entries(path: &std::path::Path) -> Vec<(String, Vec<u8>)> {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut bytes = Vec::new();
                entry.read_to_end(&mut bytes).unwrap();
                (entry.name().to_string(), bytes)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_merge_keeps_file_then_page_order() {
        let f = fixture().await;
        let job = job(
            &f.invoker,
            Operation::Merge,
            &[("a.pdf", pdf(&[101.0, 102.0])), ("b.pdf", pdf(&[201.0, 202.0, 203.0]))],
            &[],
        )
        .await;

        let outcome = f.invoker.run(job).await.unwrap();
        assert_eq!(outcome.filename, "merged.pdf");
        let bytes = std::fs::read(&outcome.output.path).unwrap();
        assert_eq!(widths(&bytes), vec![101.0, 102.0, 201.0, 202.0, 203.0]);
        assert_eq!(outcome.output.size, bytes.len() as u64);
    }

    #[tokio::test]
    async fn test_split_every_two_bundles_chunks() {
        let f = fixture().await;
        let job = job(
            &f.invoker,
            Operation::Split,
            &[("report.pdf", pdf(&[1.0, 2.0, 3.0, 4.0, 5.0]))],
            &[("splitMode", "every"), ("everyN", "2")],
        )
        .await;

        let outcome = f.invoker.run(job).await.unwrap();
        assert_eq!(outcome.filename, "split_pages.zip");
        let entries = zip_entries(&outcome.output.path);
        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["page_1.pdf", "page_2.pdf", "page_3.pdf"]);
        let total: usize = entries.iter().map(|(_, b)| page_count(b).unwrap()).sum();
        assert_eq!(total, 5);
    }

    #[tokio::test]
    async fn test_split_range_yields_single_pdf() {
        let f = fixture().await;
        let job = job(
            &f.invoker,
            Operation::Split,
            &[("report.pdf", pdf(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]))],
            &[("splitMode", "range"), ("pageRange", "2,4-5")],
        )
        .await;

        let outcome = f.invoker.run(job).await.unwrap();
        assert_eq!(outcome.filename, "split.pdf");
        let bytes = std::fs::read(&outcome.output.path).unwrap();
        assert_eq!(widths(&bytes), vec![2.0, 4.0, 5.0]);
    }

    #[tokio::test]
    async fn test_inputs_are_removed_after_success_and_failure() {
        let f = fixture().await;
        let ok = job(&f.invoker, Operation::Rotate, &[("a.pdf", pdf(&[100.0]))], &[]).await;
        let ok_path = ok.inputs[0].path().to_path_buf();
        let outcome = f.invoker.run(ok).await.unwrap();
        assert!(!ok_path.exists());
        assert_eq!(outcome.filename, "a.pdf");

        let bad = job(&f.invoker, Operation::Rotate, &[("b.pdf", b"not a pdf".to_vec())], &[]).await;
        let bad_path = bad.inputs[0].path().to_path_buf();
        let err = f.invoker.run(bad).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Processing);
        assert!(!bad_path.exists());
    }

    #[tokio::test]
    async fn test_unlock_with_correct_and_wrong_password() {
        let f = fixture().await;
        let locked = security::protect(&pdf(&[100.0, 200.0]), "s3cret").unwrap();

        let wrong = job(
            &f.invoker,
            Operation::Unlock,
            &[("locked.pdf", locked.clone())],
            &[("password", "nope")],
        )
        .await;
        let err = f.invoker.run(wrong).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Incorrect password");

        let right = job(
            &f.invoker,
            Operation::Unlock,
            &[("locked.pdf", locked)],
            &[("password", "s3cret")],
        )
        .await;
        let outcome = f.invoker.run(right).await.unwrap();
        let bytes = std::fs::read(&outcome.output.path).unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert!(!doc.is_encrypted());
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_transform_gives_distinct_identical_outputs() {
        let f = fixture().await;
        let source = pdf(&[100.0, 200.0, 300.0]);
        let first = job(&f.invoker, Operation::Rotate, &[("a.pdf", source.clone())], &[]).await;
        let second = job(&f.invoker, Operation::Rotate, &[("a.pdf", source)], &[]).await;

        let first = f.invoker.run(first).await.unwrap();
        let second = f.invoker.run(second).await.unwrap();
        assert_ne!(first.output.name, second.output.name);
        assert_eq!(
            std::fs::read(&first.output.path).unwrap(),
            std::fs::read(&second.output.path).unwrap()
        );
    }

    #[tokio::test]
    async fn test_compress_reports_sizes() {
        let f = fixture().await;
        let source = pdf(&[100.0, 200.0]);
        let len = source.len() as u64;
        let job = job(&f.invoker, Operation::Compress, &[("big.pdf", source)], &[]).await;

        let outcome = f.invoker.run(job).await.unwrap();
        assert_eq!(outcome.extras["originalSize"], len);
        assert_eq!(outcome.extras["compressedSize"], outcome.output.size);
        assert!(outcome.extras["reduction"].as_str().unwrap().ends_with('%'));
    }

    #[tokio::test]
    async fn test_fallback_conversion_carries_note() {
        let f = fixture().await;
        let job = job(&f.invoker, Operation::PdfToExcel, &[("table.pdf", pdf(&[100.0]))], &[]).await;

        let outcome = f.invoker.run(job).await.unwrap();
        assert_eq!(outcome.filename, "table.csv");
        assert!(outcome.note.unwrap().contains("CSV"));
    }

    #[tokio::test]
    async fn test_pdf_to_jpg_fallback_bundles_pages() {
        let f = fixture().await;
        let job = job(
            &f.invoker,
            Operation::PdfToJpg,
            &[("slides.pdf", pdf(&[100.0, 200.0]))],
            &[("quality", "low")],
        )
        .await;

        let outcome = f.invoker.run(job).await.unwrap();
        assert_eq!(outcome.filename, "pdf_pages.zip");
        assert_eq!(outcome.extras["pageCount"], 2);
        let names: Vec<_> = zip_entries(&outcome.output.path)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["page_1.jpg", "page_2.jpg"]);
    }

    #[tokio::test]
    async fn test_missing_converter_is_not_implemented() {
        let f = fixture().await;
        let job = job(&f.invoker, Operation::PptToPdf, &[("deck.pptx", b"PK".to_vec())], &[]).await;

        let err = f.invoker.run(job).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotImplemented);
        assert!(err.details.unwrap().get("install").is_some());
    }
}
