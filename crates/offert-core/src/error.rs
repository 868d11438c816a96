use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no delimiter produces a consistent field count across the sampled lines")]
    AmbiguousDelimiter,

    #[error("page {page}: could not establish a header mapping for the table layout")]
    UnrecognizedTableLayout { page: usize },

    #[error("no page yielded any recognizable table content")]
    DocumentUnparsable,

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("failed to read spreadsheet: {0}")]
    Sheet(String),

    #[error("failed to load alias table from {path}: {reason}")]
    AliasLoad { path: PathBuf, reason: String },

    #[error("invalid alias table: {0}")]
    AliasInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
