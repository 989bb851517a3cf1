use crate::engine::SearchEngine;
use crate::error::{IngestError, Result, SearchError};
use crate::extractor::{extract_text_with, LopdfExtractor, PdfExtractor};
use crate::models::{DocumentSummary, IngestionOptions};
use crate::service::SearchService;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// SHA-256 hex digest of file contents. Identical uploads share an id.
pub fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Stable id for a document loaded from `path`.
pub fn generate_document_id(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn document_label(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    pub path: PathBuf,
    pub id: String,
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub documents: Vec<ExtractedPdf>,
    pub skipped_files: Vec<SkippedPdf>,
}

#[derive(Debug, Default, Serialize)]
pub struct IngestionReport {
    pub added: Vec<DocumentSummary>,
    pub skipped: Vec<SkippedPdf>,
}

impl IngestionReport {
    fn record(&mut self, path: PathBuf, outcome: Result<DocumentSummary, SearchError>) {
        match outcome {
            Ok(summary) => self.added.push(summary),
            Err(error) => self.skip(path, error.to_string()),
        }
    }

    fn skip(&mut self, path: PathBuf, reason: String) {
        tracing::warn!(path = %path.display(), reason = %reason, "skipped pdf");
        self.skipped.push(SkippedPdf { path, reason });
    }
}

/// Extracts every PDF under `folder`. Files that fail are reported as skipped
/// and never abort the batch.
pub fn extract_folder(folder: &Path, options: &IngestionOptions) -> Result<ExtractionReport> {
    extract_folder_with(&LopdfExtractor, folder, options)
}

pub fn extract_folder_with<E: PdfExtractor + ?Sized>(
    extractor: &E,
    folder: &Path,
    options: &IngestionOptions,
) -> Result<ExtractionReport> {
    let files = discover_pdf_files(folder);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    let mut report = ExtractionReport::default();

    for path in files {
        let extracted = (|| {
            let label = document_label(&path)?;
            let text = extract_text_with(extractor, &path, options.max_pages)?;
            Ok::<_, IngestError>((label, text))
        })();

        match extracted {
            Ok((_, text)) if text.is_empty() && options.skip_empty => {
                tracing::warn!(path = %path.display(), "pdf has no extractable text");
                report.skipped_files.push(SkippedPdf {
                    path,
                    reason: "no extractable text".to_string(),
                });
            }
            Ok((label, text)) => report.documents.push(ExtractedPdf {
                id: generate_document_id(&path),
                path,
                label,
                text,
            }),
            Err(error) => {
                tracing::warn!(path = %path.display(), reason = %error, "skipped pdf");
                report.skipped_files.push(SkippedPdf {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(report)
}

/// Adds every readable PDF under `folder` to `engine`.
pub fn ingest_folder(
    engine: &mut SearchEngine,
    folder: &Path,
    options: &IngestionOptions,
) -> Result<IngestionReport> {
    let extraction = extract_folder(folder, options)?;
    Ok(add_extracted(extraction, |pdf| engine.add(&pdf.id, &pdf.label, &pdf.text)))
}

/// Same as [`ingest_folder`] for a shared service. Extraction runs on a
/// blocking thread.
pub async fn ingest_folder_into(
    service: &SearchService,
    folder: PathBuf,
    options: IngestionOptions,
) -> Result<IngestionReport> {
    let extraction = tokio::task::spawn_blocking(move || extract_folder(&folder, &options))
        .await
        .map_err(|error| IngestError::PdfParse(format!("extraction task failed: {error}")))??;

    let mut report = IngestionReport {
        skipped: extraction.skipped_files,
        ..IngestionReport::default()
    };
    for pdf in extraction.documents {
        let outcome = service.add(&pdf.id, &pdf.label, &pdf.text).await;
        report.record(pdf.path, outcome);
    }
    Ok(report)
}

fn add_extracted<F>(extraction: ExtractionReport, mut add: F) -> IngestionReport
where
    F: FnMut(&ExtractedPdf) -> Result<DocumentSummary, SearchError>,
{
    let mut report = IngestionReport {
        skipped: extraction.skipped_files,
        ..IngestionReport::default()
    };
    for pdf in extraction.documents {
        let outcome = add(&pdf);
        report.record(pdf.path, outcome);
    }
    report
}
