pub mod schedule;

use crate::alias::AliasTable;
use crate::extraction::RawPage;
use crate::model::{CanonicalField, Diagnostics, PageResult, Row};
use crate::parsing::tokens::{
    self, has_decimal_separator, is_amount_like, is_date_like, is_integer_like, is_serial_like,
};

/// Column-position to canonical-field mapping established from a header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    fields: Vec<Option<CanonicalField>>,
}

impl HeaderMap {
    fn width(&self) -> usize {
        self.fields.len()
    }

    fn field_at(&self, pos: usize) -> Option<CanonicalField> {
        self.fields.get(pos).copied().flatten()
    }

    fn maps(&self, field: CanonicalField) -> bool {
        self.fields.contains(&Some(field))
    }
}

/// A row opened by a product/description line that is still waiting for
/// its price, possibly across a page boundary.
#[derive(Debug, Clone)]
struct PendingRow {
    row: Row,
    page_number: usize,
}

/// Cross-page reconstruction state.
///
/// Multi-page PDF tables usually omit repeated headers, and suppliers
/// split logical rows across page breaks; both dependencies are threaded
/// through this explicit value so reconstruction itself stays a pure
/// function of its input pages.
#[derive(Debug, Clone, Default)]
struct Carry {
    header: Option<HeaderMap>,
    pending: Option<PendingRow>,
}

/// What a tokenized line turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Data,
    Continuation,
    OnePay,
    Noise,
}

/// Substring markers of aggregate-charge ("one-pay") lines. Vendors add
/// new spellings over time; extending this list is the whole change.
const ONE_PAY_MARKERS: &[&str] = &[
    "return to hw supp",
    "return to hardware supp",
    "one-pay",
    "one pay",
    "onepay",
];

#[derive(Debug, Clone, Default)]
pub struct ReconstructionOutcome {
    pub pages: Vec<PageResult>,
    pub diagnostics: Diagnostics,
}

/// Reconstruct canonical rows from freeform text pages.
///
/// One `PageResult` per successfully processed page, in input order. Pages
/// where no header mapping could be established are listed in
/// `diagnostics.unrecognized_pages` instead; malformed lines are dropped
/// and counted, never fatal.
pub fn reconstruct(
    pages: &[RawPage],
    aliases: &AliasTable,
    country: Option<&str>,
) -> ReconstructionOutcome {
    let mut out = ReconstructionOutcome::default();
    let mut carry = Carry::default();

    for page in pages {
        reconstruct_page(page, &mut carry, aliases, country, &mut out);
    }

    // A row still waiting for its price at document end is emitted as-is:
    // a partial line item beats dropping a real one.
    if let Some(pending) = carry.pending.take() {
        emit(&mut out.pages, pending.page_number, pending.row);
    }

    out
}

fn reconstruct_page(
    page: &RawPage,
    carry: &mut Carry,
    aliases: &AliasTable,
    country: Option<&str>,
    out: &mut ReconstructionOutcome,
) {
    let mode = tokens::dominant_token_mode(&page.lines);
    let correlation = page_correlation_token(&page.lines, aliases, country);

    let mut rows: Vec<Row> = Vec::new();
    let mut failed_headers = 0usize;

    for line in &page.lines {
        if line.trim().is_empty() {
            continue;
        }
        let toks = tokens::tokenize(line, mode);
        let populated = toks.iter().filter(|t| !t.trim().is_empty()).count();

        if populated < 2 {
            out.diagnostics
                .record(page.page_number, line, "fewer than 2 fields");
            continue;
        }

        // Header detection runs before row classification; a new header
        // replaces the mapping for the rest of the document.
        if is_header_candidate(&toks, aliases, country) {
            match header_map(&toks, aliases, country) {
                Some(map) => {
                    flush_pending(carry, &mut rows, out, page.page_number);
                    carry.header = Some(map);
                    failed_headers = 0;
                }
                None => {
                    failed_headers += 1;
                    out.diagnostics.record(
                        page.page_number,
                        line,
                        "header-like line did not resolve",
                    );
                    if failed_headers >= 2 && carry.header.is_none() {
                        out.diagnostics.unrecognized_pages.push(page.page_number);
                        return;
                    }
                }
            }
            continue;
        }
        failed_headers = 0;

        let Some(header) = carry.header.clone() else {
            out.diagnostics
                .record(page.page_number, line, "line before any header mapping");
            continue;
        };

        match classify_line(&toks, &header, carry.pending.is_some()) {
            LineKind::Continuation => {
                merge_continuation(&toks, carry, &mut rows, out, page.page_number);
            }
            LineKind::OnePay => {
                flush_pending(carry, &mut rows, out, page.page_number);
                let mut row = map_tokens(&toks, &header);
                row.is_one_pay = true;
                attach_correlation(&mut row, &correlation);
                rows.push(row);
            }
            LineKind::Data => {
                flush_pending(carry, &mut rows, out, page.page_number);
                let mut row = map_tokens(&toks, &header);
                attach_correlation(&mut row, &correlation);
                if row.has(CanonicalField::Price) {
                    rows.push(row);
                } else if row.has(CanonicalField::ProductNo) {
                    carry.pending = Some(PendingRow {
                        row,
                        page_number: page.page_number,
                    });
                } else {
                    // Description-only fragments without a product number
                    // are section titles, not wrapped rows.
                    out.diagnostics.record(
                        page.page_number,
                        line,
                        "row fragment without product number",
                    );
                }
            }
            LineKind::Noise => {
                out.diagnostics
                    .record(page.page_number, line, "unclassifiable line");
            }
        }
    }

    out.pages.push(PageResult {
        page_number: page.page_number,
        rows,
    });
}

/// Classify a tokenized line under an established header mapping.
fn classify_line(toks: &[String], header: &HeaderMap, pending_open: bool) -> LineKind {
    let populated: Vec<&str> = toks
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();

    // Short numeric-only lines complete the preceding row; without one
    // they are stray artifacts.
    if populated.len() <= 3 && populated.iter().all(|t| is_amount_like(t)) {
        return if pending_open {
            LineKind::Continuation
        } else {
            LineKind::Noise
        };
    }

    let candidate = map_tokens(toks, header);
    if is_one_pay(&candidate, &populated) {
        return LineKind::OnePay;
    }
    if candidate.has(CanonicalField::ProductNo) || candidate.has(CanonicalField::Description) {
        return LineKind::Data;
    }
    LineKind::Noise
}

/// Aggregate-charge lines carry a coverage start date but no per-unit
/// serial or quantity, and match a known marker.
fn is_one_pay(candidate: &Row, populated: &[&str]) -> bool {
    if !candidate.has(CanonicalField::DateFrom)
        || candidate.has(CanonicalField::SerialNo)
        || candidate.has(CanonicalField::Quantity)
    {
        return false;
    }
    let joined = populated.join(" ").to_lowercase();
    ONE_PAY_MARKERS.iter().any(|m| joined.contains(m))
}

/// Merge a numeric-only continuation line into the open pending row.
/// Continuations contribute only to Quantity and Price, and never create
/// a row of their own.
fn merge_continuation(
    toks: &[String],
    carry: &mut Carry,
    rows: &mut Vec<Row>,
    out: &mut ReconstructionOutcome,
    current_page: usize,
) {
    let complete = match carry.pending.as_mut() {
        Some(pending) => {
            for tok in toks.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                if has_decimal_separator(tok) || !is_integer_like(tok) {
                    pending.row.set(CanonicalField::Price, tok.to_string());
                } else if !pending.row.has(CanonicalField::Quantity) {
                    pending.row.set(CanonicalField::Quantity, tok.to_string());
                } else {
                    pending.row.set(CanonicalField::Price, tok.to_string());
                }
            }
            pending.row.has(CanonicalField::Price)
        }
        None => return,
    };

    if complete {
        if let Some(done) = carry.pending.take() {
            if done.page_number == current_page {
                rows.push(done.row);
            } else {
                emit(&mut out.pages, done.page_number, done.row);
            }
        }
    }
}

/// A line that looks like a column header: multiple label tokens, nothing
/// that parses as an amount or a date, and at least one alias hit.
fn is_header_candidate(toks: &[String], aliases: &AliasTable, country: Option<&str>) -> bool {
    let populated: Vec<&str> = toks
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if populated.len() < 2 {
        return false;
    }
    if populated.iter().any(|t| is_amount_like(t) || is_date_like(t)) {
        return false;
    }
    populated
        .iter()
        .any(|t| aliases.resolve(t, country).is_some())
}

/// Build the position mapping from a header line. A usable table header
/// resolves at least ProductNo plus Description or Price.
fn header_map(toks: &[String], aliases: &AliasTable, country: Option<&str>) -> Option<HeaderMap> {
    let fields: Vec<Option<CanonicalField>> =
        toks.iter().map(|t| aliases.resolve(t, country)).collect();
    let map = HeaderMap { fields };
    if map.maps(CanonicalField::ProductNo)
        && (map.maps(CanonicalField::Description) || map.maps(CanonicalField::Price))
    {
        Some(map)
    } else {
        None
    }
}

/// Map line tokens onto canonical fields.
///
/// A line with exactly the header's width maps positionally (tab-split
/// lines keep their empty columns). Narrower lines fall back to token
/// shapes, since space-run splitting cannot represent empty columns.
fn map_tokens(toks: &[String], header: &HeaderMap) -> Row {
    let mut row = Row::default();

    if toks.len() == header.width() {
        for (pos, tok) in toks.iter().enumerate() {
            let value = tok.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(field) = header.field_at(pos) {
                row.set(field, value.to_string());
            }
        }
        return row;
    }

    let populated: Vec<&str> = toks
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    let mut description_parts: Vec<&str> = Vec::new();
    let mut amounts: Vec<&str> = Vec::new();

    for (i, tok) in populated.iter().enumerate() {
        if i == 0
            && header.maps(CanonicalField::ProductNo)
            && !is_date_like(tok)
            && !has_decimal_separator(tok)
            && tok.chars().any(|c| c.is_ascii_digit())
        {
            // Product codes carry digits; a letters-only lead token is a
            // section title, not a product number.
            row.set(CanonicalField::ProductNo, tok.to_string());
            continue;
        }
        if is_date_like(tok) {
            if header.maps(CanonicalField::DateFrom) && !row.has(CanonicalField::DateFrom) {
                row.set(CanonicalField::DateFrom, tok.to_string());
            } else if header.maps(CanonicalField::DateTo) && !row.has(CanonicalField::DateTo) {
                row.set(CanonicalField::DateTo, tok.to_string());
            } else {
                description_parts.push(tok);
            }
            continue;
        }
        if is_amount_like(tok) {
            amounts.push(tok);
            continue;
        }
        if is_serial_like(tok)
            && header.maps(CanonicalField::SerialNo)
            && !row.has(CanonicalField::SerialNo)
        {
            row.set(CanonicalField::SerialNo, tok.to_string());
            continue;
        }
        description_parts.push(tok);
    }

    // Rightmost amount is the price column; an integer before it is the
    // quantity.
    if let Some(price) = amounts.pop() {
        row.set(CanonicalField::Price, price.to_string());
    }
    if let Some(qty) = amounts.pop() {
        if is_integer_like(qty) && header.maps(CanonicalField::Quantity) {
            row.set(CanonicalField::Quantity, qty.to_string());
        }
    }
    if !description_parts.is_empty() && header.maps(CanonicalField::Description) {
        row.set(CanonicalField::Description, description_parts.join(" "));
    }

    row
}

/// Some formats carry the agreement/account token once per page in a
/// dedicated label line rather than per row; find it so it can be attached
/// to every row of the page.
fn page_correlation_token(
    lines: &[String],
    aliases: &AliasTable,
    country: Option<&str>,
) -> Option<String> {
    for line in lines {
        // Dedicated label lines are short; table rows are not.
        let column_count = if line.contains('\t') {
            line.split('\t').filter(|t| !t.trim().is_empty()).count()
        } else {
            tokens::split_by_space_runs(line).len()
        };
        if column_count > 3 {
            continue;
        }
        for alias in aliases.spellings_for(CanonicalField::Searchable) {
            if let Some(value) = extract_after_label(line, alias) {
                return Some(value);
            }
        }
    }
    None
}

fn attach_correlation(row: &mut Row, correlation: &Option<String>) {
    if row.searchable.is_none() {
        if let Some(token) = correlation {
            row.searchable = Some(token.clone());
        }
    }
}

/// Extract a value appearing after a label (case-insensitive).
/// Handles patterns like "Label: value" or "Label    value" and truncates
/// at the next large whitespace gap to avoid capturing trailing fields.
fn extract_after_label(line: &str, label: &str) -> Option<String> {
    let lower = line.to_lowercase();
    let label_lower = label.to_lowercase();
    // Label punctuation varies per vendor ("Agreement No." vs
    // "Agreement No:"); match on the bare label.
    let label_lower = label_lower.trim_end_matches([':', '.']);
    let idx = lower.find(label_lower)?;
    let after = &line[idx + label_lower.len()..];
    let trimmed = after.trim_start_matches(|c: char| c == ':' || c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        return None;
    }
    let value = if let Some(gap_pos) = trimmed.find("   ") {
        trimmed[..gap_pos].trim()
    } else {
        trimmed.trim()
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn flush_pending(
    carry: &mut Carry,
    rows: &mut Vec<Row>,
    out: &mut ReconstructionOutcome,
    current_page: usize,
) {
    if let Some(pending) = carry.pending.take() {
        if pending.page_number == current_page {
            rows.push(pending.row);
        } else {
            emit(&mut out.pages, pending.page_number, pending.row);
        }
    }
}

fn emit(pages: &mut [PageResult], page_number: usize, row: Row) {
    if let Some(page) = pages
        .iter_mut()
        .rev()
        .find(|p| p.page_number == page_number)
    {
        page.rows.push(row);
    }
}
