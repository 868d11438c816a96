use crate::error::IngestError;
use crate::extraction::{RawPage, TextExtractor};
use std::io::Write;
use std::process::Command;

/// Text extraction backend using pdftotext (from poppler-utils).
///
/// Uses `pdftotext -layout` so column alignment of tables survives as
/// whitespace runs.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdftotextExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<RawPage>, IngestError> {
        // Write document bytes to a temp file
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| IngestError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(bytes)
            .map_err(|e| IngestError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    IngestError::PdftotextNotFound
                } else {
                    IngestError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(IngestError::PdftotextFailed { code, stderr });
        }

        let text = String::from_utf8_lossy(&output.stdout);

        // pdftotext uses form feed \x0c as page separator
        let pages: Vec<RawPage> = text
            .split('\x0c')
            .enumerate()
            .map(|(i, page_text)| RawPage {
                page_number: i + 1,
                lines: page_text.lines().map(|l| l.to_string()).collect(),
            })
            .filter(|p| !p.lines.is_empty() || p.page_number == 1)
            .collect();

        Ok(pages)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}
