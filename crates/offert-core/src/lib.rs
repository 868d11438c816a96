pub mod alias;
pub mod error;
pub mod extraction;
pub mod model;
pub mod parsing;
pub mod reconstruct;
pub mod tabular;

use alias::AliasTable;
use error::IngestError;
use extraction::{SheetExtractor, SheetGrid, TextExtractor};
use model::{DocumentKind, Delimiter, IngestionResult, PageResult};

pub use model::IngestOptions;

/// One supplier document, paired with the extraction backend its declared
/// format needs. The engine itself never touches files or processes.
pub enum DocumentSource<'a> {
    /// CSV-style delimited text. An explicit delimiter skips detection,
    /// which is the recovery path when detection reports
    /// `AmbiguousDelimiter`.
    Delimited {
        text: &'a str,
        delimiter: Option<Delimiter>,
    },
    /// Excel-style workbook bytes.
    Spreadsheet {
        bytes: &'a [u8],
        extractor: &'a dyn SheetExtractor,
    },
    /// Freeform text layout (PDF, Word) reconstructed positionally.
    Freeform {
        bytes: &'a [u8],
        extractor: &'a dyn TextExtractor,
    },
}

/// Main API entry point: ingest one supplier document into canonical
/// rows (price lists) or payment periods (schedules).
///
/// Extraction is best-effort: malformed lines are dropped and counted in
/// the result's diagnostics. The only whole-document failure besides
/// backend errors is a freeform price list where every page failed header
/// detection.
pub fn ingest(
    source: DocumentSource<'_>,
    kind: DocumentKind,
    aliases: &AliasTable,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError> {
    match source {
        DocumentSource::Delimited { text, delimiter } => {
            ingest_delimited(text, delimiter, kind, aliases, options)
        }
        DocumentSource::Spreadsheet { bytes, extractor } => {
            let sheets = extractor.extract_sheets(bytes)?;
            Ok(ingest_sheets(&sheets, kind, aliases, options))
        }
        DocumentSource::Freeform { bytes, extractor } => {
            let pages = extractor.extract_pages(bytes)?;
            ingest_pages(&pages, kind, aliases, options)
        }
    }
}

fn ingest_delimited(
    text: &str,
    delimiter: Option<Delimiter>,
    kind: DocumentKind,
    aliases: &AliasTable,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError> {
    let lines: Vec<&str> = text.lines().collect();
    let delimiter = match delimiter {
        Some(d) => d,
        None => parsing::delimiter::guess(&lines)?,
    };

    let grid: Vec<Vec<String>> = lines
        .iter()
        .map(|line| {
            line.split(delimiter.as_char())
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect();

    let mut result = IngestionResult::default();
    match kind {
        DocumentKind::DistributorPriceList => {
            let outcome = tabular::read(&grid, aliases, options.country.as_deref());
            for skipped in &outcome.skipped {
                result.diagnostics.record(1, skipped, "no usable field values");
            }
            result.pages.push(PageResult {
                page_number: 1,
                rows: outcome.rows,
            });
        }
        DocumentKind::PaymentSchedule => {
            let outcome = reconstruct::schedule::extract_cells(&grid);
            for skipped in &outcome.skipped {
                result.diagnostics.record(1, skipped, "not a period line");
            }
            result.periods = outcome.periods;
        }
    }
    Ok(result)
}

fn ingest_sheets(
    sheets: &[SheetGrid],
    kind: DocumentKind,
    aliases: &AliasTable,
    options: &IngestOptions,
) -> IngestionResult {
    let mut result = IngestionResult::default();

    for (index, sheet) in sheets.iter().enumerate() {
        let page_number = index + 1;
        match kind {
            DocumentKind::DistributorPriceList => {
                let outcome = tabular::read(&sheet.rows, aliases, options.country.as_deref());
                for skipped in &outcome.skipped {
                    result
                        .diagnostics
                        .record(page_number, skipped, "no usable field values");
                }
                // A sheet without a heading still produces a (row-less)
                // page so callers see it was looked at.
                result.pages.push(PageResult {
                    page_number,
                    rows: outcome.rows,
                });
            }
            DocumentKind::PaymentSchedule => {
                let outcome = reconstruct::schedule::extract_cells(&sheet.rows);
                for skipped in &outcome.skipped {
                    result
                        .diagnostics
                        .record(page_number, skipped, "not a period line");
                }
                result.periods.extend(outcome.periods);
            }
        }
    }

    result
}

fn ingest_pages(
    pages: &[extraction::RawPage],
    kind: DocumentKind,
    aliases: &AliasTable,
    options: &IngestOptions,
) -> Result<IngestionResult, IngestError> {
    let mut result = IngestionResult::default();

    match kind {
        DocumentKind::DistributorPriceList => {
            let outcome = reconstruct::reconstruct(pages, aliases, options.country.as_deref());
            result.pages = outcome.pages;
            result.diagnostics = outcome.diagnostics;

            if !pages.is_empty() && result.diagnostics.unrecognized_pages.len() == pages.len() {
                return Err(IngestError::DocumentUnparsable);
            }
        }
        DocumentKind::PaymentSchedule => {
            for page in pages {
                let outcome = reconstruct::schedule::extract(page);
                for skipped in &outcome.skipped {
                    result
                        .diagnostics
                        .record(page.page_number, skipped, "not a period line");
                }
                result.periods.extend(outcome.periods);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::builtin::builtin_alias_table;

    #[test]
    fn delimited_price_list_roundtrip() {
        let aliases = builtin_alias_table().unwrap();
        let text = "Product No.;Description;Qty;Price\n818208-B21;HPE DL360 Gen10;1;55.00\n";

        let result = ingest(
            DocumentSource::Delimited {
                text,
                delimiter: None,
            },
            DocumentKind::DistributorPriceList,
            &aliases,
            &IngestOptions::default(),
        )
        .unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].rows.len(), 1);
        assert_eq!(
            result.pages[0].rows[0].product_no.as_deref(),
            Some("818208-B21")
        );
    }

    #[test]
    fn explicit_delimiter_overrides_detection() {
        let aliases = builtin_alias_table().unwrap();
        let text = "Product No.:Description:Price\n818208-B21:HPE DL360:55,00\n";

        let result = ingest(
            DocumentSource::Delimited {
                text,
                delimiter: Some(Delimiter::Colon),
            },
            DocumentKind::DistributorPriceList,
            &aliases,
            &IngestOptions::default(),
        )
        .unwrap();

        assert_eq!(result.pages[0].rows.len(), 1);
        assert_eq!(result.pages[0].rows[0].price.as_deref(), Some("55,00"));
    }
}
