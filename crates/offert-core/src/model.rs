use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed semantic columns all vendor-specific headers are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    ProductNo,
    Description,
    SerialNo,
    DateFrom,
    DateTo,
    Quantity,
    Price,
    Searchable,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::ProductNo,
        CanonicalField::Description,
        CanonicalField::SerialNo,
        CanonicalField::DateFrom,
        CanonicalField::DateTo,
        CanonicalField::Quantity,
        CanonicalField::Price,
        CanonicalField::Searchable,
    ];

    /// Searchable is a correlation key, not line-item content.
    /// A row whose only populated field is decorative is a separator, not data.
    pub fn is_decorative(self) -> bool {
        matches!(self, CanonicalField::Searchable)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CanonicalField::ProductNo => "product_no",
            CanonicalField::Description => "description",
            CanonicalField::SerialNo => "serial_no",
            CanonicalField::DateFrom => "date_from",
            CanonicalField::DateTo => "date_to",
            CanonicalField::Quantity => "quantity",
            CanonicalField::Price => "price",
            CanonicalField::Searchable => "searchable",
        };
        write!(f, "{name}")
    }
}

/// Field separator of a delimited text file. Derived per document, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Colon,
}

impl Delimiter {
    /// Candidate order doubles as tie-break preference.
    pub const ALL: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Colon,
    ];

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
            Delimiter::Colon => ':',
        }
    }
}

/// What kind of document the caller declared this to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    DistributorPriceList,
    PaymentSchedule,
}

/// One canonical row record. Values are raw source strings; type coercion
/// is a downstream concern. Immutable once emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub product_no: Option<String>,
    pub description: Option<String>,
    pub serial_no: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub quantity: Option<String>,
    pub price: Option<String>,
    /// Vendor-specific correlation token (agreement/account number) attached
    /// to every row of the page it was found on.
    pub searchable: Option<String>,
    /// True for lump-sum aggregate charges ("return to hardware support"
    /// lines). One-pay rows are never merge targets.
    pub is_one_pay: bool,
}

impl Row {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        let slot = match field {
            CanonicalField::ProductNo => &self.product_no,
            CanonicalField::Description => &self.description,
            CanonicalField::SerialNo => &self.serial_no,
            CanonicalField::DateFrom => &self.date_from,
            CanonicalField::DateTo => &self.date_to,
            CanonicalField::Quantity => &self.quantity,
            CanonicalField::Price => &self.price,
            CanonicalField::Searchable => &self.searchable,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, field: CanonicalField, value: String) {
        let slot = match field {
            CanonicalField::ProductNo => &mut self.product_no,
            CanonicalField::Description => &mut self.description,
            CanonicalField::SerialNo => &mut self.serial_no,
            CanonicalField::DateFrom => &mut self.date_from,
            CanonicalField::DateTo => &mut self.date_to,
            CanonicalField::Quantity => &mut self.quantity,
            CanonicalField::Price => &mut self.price,
            CanonicalField::Searchable => &mut self.searchable,
        };
        *slot = Some(value);
    }

    pub fn has(&self, field: CanonicalField) -> bool {
        self.get(field).is_some_and(|v| !v.trim().is_empty())
    }

    /// True if any non-decorative field carries a value.
    pub fn has_content(&self) -> bool {
        CanonicalField::ALL
            .iter()
            .any(|f| !f.is_decorative() && self.has(*f))
    }
}

/// Rows extracted from one page, in source order. A processed page with no
/// table content has an empty `rows`, so callers can tell "no data" apart
/// from "page not processed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub page_number: usize,
    pub rows: Vec<Row>,
}

/// One payment period of a schedule. Dates are source literals; the amount
/// is parsed tolerantly of locale separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub date_from: String,
    pub date_to: String,
    pub price: Decimal,
}

/// A line or row that was dropped during extraction, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedLine {
    pub page_number: usize,
    pub line_text: String,
    pub reason: String,
}

/// Per-document extraction diagnostics. Surfaced to the caller, never
/// logged from inside the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub discarded_lines: Vec<DiscardedLine>,
    /// Pages where no header mapping could be established.
    pub unrecognized_pages: Vec<usize>,
}

impl Diagnostics {
    pub fn discarded_line_count(&self) -> usize {
        self.discarded_lines.len()
    }

    pub fn record(&mut self, page_number: usize, line_text: &str, reason: &str) {
        self.discarded_lines.push(DiscardedLine {
            page_number,
            line_text: line_text.to_string(),
            reason: reason.to_string(),
        });
    }
}

/// Full result of ingesting one document.
///
/// Price lists populate `pages`; payment schedules populate `periods`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionResult {
    #[serde(default)]
    pub pages: Vec<PageResult>,
    #[serde(default)]
    pub periods: Vec<SchedulePeriod>,
    pub diagnostics: Diagnostics,
}

/// Caller-supplied knobs for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Country code scoping alias resolution (falls back to global aliases).
    pub country: Option<String>,
}
