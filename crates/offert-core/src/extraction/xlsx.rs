use std::io::Cursor;

use calamine::{Reader, Xlsx};

use crate::error::IngestError;
use crate::extraction::{SheetExtractor, SheetGrid};

/// Spreadsheet extraction backend using calamine.
///
/// Every worksheet becomes one grid; cell values are stringified without
/// interpretation so the readers downstream see the source literals.
pub struct XlsxExtractor;

impl XlsxExtractor {
    pub fn new() -> Self {
        XlsxExtractor
    }
}

impl Default for XlsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetExtractor for XlsxExtractor {
    fn extract_sheets(&self, bytes: &[u8]) -> Result<Vec<SheetGrid>, IngestError> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
            .map_err(|e| IngestError::Sheet(format!("failed to open xlsx: {e}")))?;

        let names: Vec<String> = workbook.sheet_names().to_vec();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| IngestError::Sheet(format!("sheet '{name}': {e}")))?;
            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();
            sheets.push(SheetGrid { name, rows });
        }

        Ok(sheets)
    }

    fn backend_name(&self) -> &str {
        "calamine"
    }
}

fn cell_to_string(cell: &calamine::Data) -> String {
    match cell {
        calamine::Data::String(s) => s.trim().to_string(),
        calamine::Data::Float(f) => f.to_string(),
        calamine::Data::Int(i) => i.to_string(),
        calamine::Data::DateTime(dt) => dt.to_string(),
        calamine::Data::Empty => String::new(),
        _ => format!("{cell}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_values_stringify_as_source_literals() {
        assert_eq!(cell_to_string(&calamine::Data::String("  Qty ".into())), "Qty");
        assert_eq!(cell_to_string(&calamine::Data::Int(3)), "3");
        assert_eq!(cell_to_string(&calamine::Data::Empty), "");
    }
}
