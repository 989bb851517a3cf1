pub mod bm25;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod service;
pub mod snippet;
pub mod store;
pub mod tokenizer;

pub use bm25::Bm25Index;
pub use engine::{CorpusSnapshot, IndexState, SearchEngine};
pub use error::{IngestError, SearchError};
pub use extractor::{extract_text, extract_text_with, ensure_pdf_path, LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{
    content_digest, discover_pdf_files, extract_folder, ingest_folder, ingest_folder_into,
    ExtractionReport, IngestionReport, SkippedPdf,
};
pub use models::{
    validate_limit, Bm25Params, DocumentSummary, EngineConfig, IndexStatus, IngestionOptions,
    SearchHit, DEFAULT_RESULT_LIMIT, DEFAULT_SNIPPET_WINDOW, MAX_RESULT_LIMIT,
};
pub use service::SearchService;
pub use snippet::snippet;
pub use store::{Document, DocumentStore};
pub use tokenizer::{normalize_whitespace, tokenize};
