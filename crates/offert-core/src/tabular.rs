use crate::alias::AliasTable;
use crate::model::{CanonicalField, Row};

/// A heading row needs at least this many populated cells before it is
/// worth resolving; single-cell title rows never qualify.
const MIN_HEADING_CELLS: usize = 2;

/// Result of reading one cell grid.
#[derive(Debug, Clone, Default)]
pub struct TabularOutcome {
    pub rows: Vec<Row>,
    /// Rows after the heading that carried no usable field value
    /// (blank separators, section titles), kept for diagnostics.
    pub skipped: Vec<String>,
}

/// Read a cell grid (spreadsheet sheet or delimiter-split lines) into
/// canonical rows.
///
/// The first row with enough populated cells of which at least one
/// resolves through the alias table becomes the heading; everything after
/// it is data. A data row must populate at least one non-decorative
/// canonical field or it is skipped. Cell values pass through as raw
/// strings; type coercion is a downstream concern. A grid without a
/// heading row yields zero rows; some sheets are cover pages.
pub fn read(grid: &[Vec<String>], aliases: &AliasTable, country: Option<&str>) -> TabularOutcome {
    let Some((heading_idx, mapping)) = find_heading(grid, aliases, country) else {
        return TabularOutcome::default();
    };

    let mut outcome = TabularOutcome::default();
    for row in &grid[heading_idx + 1..] {
        let mut record = Row::default();
        for (pos, cell) in row.iter().enumerate() {
            let Some(Some(field)) = mapping.get(pos) else {
                continue;
            };
            let value = cell.trim();
            if !value.is_empty() {
                record.set(*field, value.to_string());
            }
        }

        if record.has_content() {
            outcome.rows.push(record);
        } else {
            let text = row.join(" ");
            let text = text.trim();
            if !text.is_empty() {
                outcome.skipped.push(text.to_string());
            }
        }
    }

    outcome
}

type HeadingMapping = Vec<Option<CanonicalField>>;

fn find_heading(
    grid: &[Vec<String>],
    aliases: &AliasTable,
    country: Option<&str>,
) -> Option<(usize, HeadingMapping)> {
    for (idx, row) in grid.iter().enumerate() {
        let populated = row.iter().filter(|c| !c.trim().is_empty()).count();
        if populated < MIN_HEADING_CELLS {
            continue;
        }

        let mapping: HeadingMapping = row.iter().map(|c| aliases.resolve(c, country)).collect();
        if mapping.iter().any(|m| m.is_some()) {
            return Some((idx, mapping));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::builtin::builtin_alias_table;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn heading_found_below_title_rows() {
        let aliases = builtin_alias_table().unwrap();
        let grid = grid(&[
            &["Vendor price list 2020", "", "", ""],
            &["", "", "", ""],
            &["Product No.", "Description", "Qty", "Price"],
            &["818208-B21", "HPE DL360 Gen10", "1", "55.00"],
            &["", "", "", ""],
            &["874456-S01", "HPE Synergy 480", "2", "1963.40"],
        ]);

        let outcome = read(&grid, &aliases, None);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].product_no.as_deref(), Some("818208-B21"));
        assert_eq!(outcome.rows[0].price.as_deref(), Some("55.00"));
        assert_eq!(outcome.rows[1].quantity.as_deref(), Some("2"));
        // Blank separator row is skipped silently, not emitted as empty.
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn unmapped_columns_are_dropped() {
        let aliases = builtin_alias_table().unwrap();
        let grid = grid(&[
            &["Product No.", "Warranty Level", "Price"],
            &["818208-B21", "NBD", "55.00"],
        ]);

        let outcome = read(&grid, &aliases, None);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].product_no.as_deref(), Some("818208-B21"));
        assert_eq!(outcome.rows[0].price.as_deref(), Some("55.00"));
        assert_eq!(outcome.rows[0].description, None);
    }

    #[test]
    fn section_title_rows_between_data_are_counted() {
        let aliases = builtin_alias_table().unwrap();
        let grid = grid(&[
            &["Product No.", "Price"],
            &["818208-B21", "55.00"],
            &["Accessories", ""],
            &["874456-S01", "12.00"],
        ]);

        let outcome = read(&grid, &aliases, None);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.skipped, vec!["Accessories".to_string()]);
    }

    #[test]
    fn sheet_without_heading_yields_zero_rows() {
        let aliases = builtin_alias_table().unwrap();
        let grid = grid(&[
            &["Cover page", ""],
            &["Some note", "more text"],
        ]);

        let outcome = read(&grid, &aliases, None);
        assert!(outcome.rows.is_empty());
    }

    #[test]
    fn german_headers_resolve_with_country_scope() {
        let aliases = builtin_alias_table().unwrap();
        let grid = grid(&[
            &["Artikelnummer", "Bezeichnung", "Menge", "Preis"],
            &["818208-B21", "HPE DL360 Gen10", "1", "55,00"],
        ]);

        let outcome = read(&grid, &aliases, Some("de"));
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].quantity.as_deref(), Some("1"));
        assert_eq!(outcome.rows[0].price.as_deref(), Some("55,00"));
    }
}
