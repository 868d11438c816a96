use crate::extraction::RawPage;
use crate::model::SchedulePeriod;
use crate::parsing::tokens::{self, is_date_like, parse_amount};

/// Result of scanning one page or sheet for payment periods.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    pub periods: Vec<SchedulePeriod>,
    /// Lines that did not match the period pattern, kept for diagnostics.
    pub skipped: Vec<String>,
}

/// Labels that prefix schedule values in label-oriented layouts.
const PERIOD_LABELS: &[&str] = &[
    "from", "to", "price", "amount", "von", "bis", "preis", "betrag", "från", "till", "pris",
    "periode", "period",
];

/// Extract `(from, to, amount)` periods from a freeform schedule page.
///
/// A line yields a period when it carries exactly two date-shaped tokens
/// and at least one amount, in column order or label-prefixed order. Dates
/// keep their source spelling; separators are accepted, not normalized.
/// Anything else is skipped; an unprocessable page is an empty result,
/// never an error.
pub fn extract(page: &RawPage) -> ScheduleOutcome {
    let mode = tokens::dominant_token_mode(&page.lines);
    let mut outcome = ScheduleOutcome::default();
    for line in &page.lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells = tokens::tokenize(line, mode);
        scan_row(&cells, line, &mut outcome);
    }
    outcome
}

/// Extract periods from a schedule spreadsheet sheet.
pub fn extract_cells(rows: &[Vec<String>]) -> ScheduleOutcome {
    let mut outcome = ScheduleOutcome::default();
    for row in rows {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let joined = row.join(" ");
        scan_row(row, &joined, &mut outcome);
    }
    outcome
}

fn scan_row(cells: &[String], source_line: &str, outcome: &mut ScheduleOutcome) {
    match period_from_cells(cells) {
        Some(period) => outcome.periods.push(period),
        None => outcome.skipped.push(source_line.trim().to_string()),
    }
}

fn period_from_cells(cells: &[String]) -> Option<SchedulePeriod> {
    let mut dates: Vec<&str> = Vec::new();
    let mut amounts = Vec::new();

    for cell in cells {
        let value = strip_label_prefix(cell.trim());
        if value.is_empty() {
            continue;
        }
        if is_date_like(value) {
            dates.push(value);
            if dates.len() > 2 {
                // More than two dates is a data table, not a period line.
                return None;
            }
            continue;
        }
        if let Some(amount) = parse_amount(value) {
            amounts.push(amount);
        }
        // Other tokens (currency codes, period numbering words) are
        // tolerated.
    }

    if dates.len() != 2 {
        return None;
    }
    // The rightmost amount is the charge; leading numbers are period
    // indexes.
    let price = amounts.last().copied()?;
    Some(SchedulePeriod {
        date_from: dates[0].to_string(),
        date_to: dates[1].to_string(),
        price,
    })
}

/// Strip a leading label ("from:", "bis ", "Price:") off a token, keeping
/// the value's source spelling. Bare label tokens strip to nothing.
fn strip_label_prefix(value: &str) -> &str {
    for label in PERIOD_LABELS {
        let Some(head) = value.get(..label.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(label) {
            continue;
        }
        let remainder = &value[label.len()..];
        let rest = remainder.trim_start_matches(|c: char| c == ':' || c.is_whitespace());
        // Only strip when punctuation or whitespace separated label and
        // value; "period" must not eat into "periodic".
        if rest.len() != remainder.len() || rest.is_empty() {
            return rest.trim();
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn page(lines: &[&str]) -> RawPage {
        RawPage {
            page_number: 1,
            lines: lines.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn column_order_periods_in_source_order() {
        let out = extract(&page(&[
            "Payment schedule 2020",
            "01.01.2020   31.03.2020   4.500,00",
            "01.04.2020   30.06.2020   4.500,00",
            "01.07.2020   30.09.2020   4.750,00",
        ]));

        assert_eq!(out.periods.len(), 3);
        assert_eq!(out.periods[0].date_from, "01.01.2020");
        assert_eq!(out.periods[0].date_to, "31.03.2020");
        assert_eq!(out.periods[0].price, dec!(4500.00));
        assert_eq!(out.periods[2].price, dec!(4750.00));
        // The title line is skipped, not fatal.
        assert_eq!(out.skipped, vec!["Payment schedule 2020".to_string()]);
    }

    #[test]
    fn label_prefixed_periods() {
        let out = extract(&page(&[
            "From: 01.01.2020  To: 31.12.2020  Price: 1,963.40",
        ]));

        assert_eq!(out.periods.len(), 1);
        assert_eq!(out.periods[0].date_from, "01.01.2020");
        assert_eq!(out.periods[0].date_to, "31.12.2020");
        assert_eq!(out.periods[0].price, dec!(1963.40));
    }

    #[test]
    fn slash_dates_and_leading_index_column() {
        let out = extract(&page(&["3   01/07/2020   30/09/2020   4750.00"]));

        assert_eq!(out.periods.len(), 1);
        assert_eq!(out.periods[0].date_from, "01/07/2020");
        assert_eq!(out.periods[0].price, dec!(4750.00));
    }

    #[test]
    fn empty_or_unprocessable_page_yields_no_periods() {
        assert!(extract(&page(&[])).periods.is_empty());
        let out = extract(&page(&["No schedule here", "just prose text"]));
        assert!(out.periods.is_empty());
    }

    #[test]
    fn lines_with_extra_dates_are_not_periods() {
        let out = extract(&page(&[
            "01.01.2020   31.03.2020   30.06.2020   4.500,00",
        ]));
        assert!(out.periods.is_empty());
    }

    #[test]
    fn sheet_cells_extract_the_same_way() {
        let rows: Vec<Vec<String>> = vec![
            vec!["Period".into(), "From".into(), "To".into(), "Amount".into()],
            vec!["1".into(), "01.01.2021".into(), "31.03.2021".into(), "4500".into()],
            vec!["2".into(), "01.04.2021".into(), "30.06.2021".into(), "4500".into()],
        ];

        let out = extract_cells(&rows);
        assert_eq!(out.periods.len(), 2);
        assert_eq!(out.periods[1].date_from, "01.04.2021");
        assert_eq!(out.periods[1].price, dec!(4500));
    }

    #[test]
    fn well_formed_schedule_periods_are_contiguous() {
        // The extractor does not enforce contiguity; this documents the
        // property downstream validation relies on.
        let out = extract(&page(&[
            "01.01.2020   31.03.2020   4.500,00",
            "01.04.2020   30.06.2020   4.500,00",
        ]));

        let to = parse_dotted(&out.periods[0].date_to);
        let from = parse_dotted(&out.periods[1].date_from);
        assert_eq!(next_day(to), from);
    }

    fn parse_dotted(s: &str) -> (u32, u32, u32) {
        let parts: Vec<u32> = s.split('.').map(|p| p.parse().unwrap()).collect();
        (parts[0], parts[1], parts[2])
    }

    fn next_day((day, month, year): (u32, u32, u32)) -> (u32, u32, u32) {
        let leap = year % 4 == 0 && (year % 100 != 0 || year % 400 == 0);
        let lengths = [31, if leap { 29 } else { 28 }, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
        if day < lengths[(month - 1) as usize] {
            (day + 1, month, year)
        } else if month < 12 {
            (1, month + 1, year)
        } else {
            (1, 1, year + 1)
        }
    }
}
