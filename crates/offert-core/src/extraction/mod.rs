pub mod docx;
pub mod pdftotext;
pub mod xlsx;

use crate::error::IngestError;
use serde::{Deserialize, Serialize};

/// Raw text content of a single document page, as handed to the engine by
/// an extraction backend. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPage {
    pub page_number: usize,
    pub lines: Vec<String>,
}

/// One worksheet of cell values. Page numbers are assigned from sheet
/// order by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetGrid {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Trait for freeform text extraction backends (PDF, Word).
pub trait TextExtractor: Send + Sync {
    /// Extract text content from document bytes, one RawPage per page.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<RawPage>, IngestError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Trait for spreadsheet extraction backends.
pub trait SheetExtractor: Send + Sync {
    /// Extract cell grids from workbook bytes, one per worksheet.
    fn extract_sheets(&self, bytes: &[u8]) -> Result<Vec<SheetGrid>, IngestError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
