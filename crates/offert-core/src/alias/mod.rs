pub mod builtin;

use crate::error::IngestError;
use crate::model::CanonicalField;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One raw header spelling of a canonical column.
///
/// `country` scopes the alias; lookups fall back from country-scoped to
/// global aliases. Within one scope an alias spelling is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldAlias {
    pub field: CanonicalField,
    pub alias: String,
    #[serde(default)]
    pub country: Option<String>,
}

/// Serialized alias configuration, as loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasTableDef {
    pub version: String,
    pub aliases: Vec<FieldAlias>,
}

#[derive(Debug, Clone)]
struct AliasEntry {
    raw: String,
    normalized: String,
    country: Option<String>,
    field: CanonicalField,
}

/// Read-only alias snapshot used for header resolution.
///
/// The table is immutable once built; concurrent documents may share one
/// snapshot. Resolution order: country-scoped exact, global exact, fuzzy
/// over both scopes above the similarity threshold.
#[derive(Debug, Clone)]
pub struct AliasTable {
    scoped: HashMap<(String, String), CanonicalField>,
    global: HashMap<String, CanonicalField>,
    entries: Vec<AliasEntry>,
    fuzzy_threshold: f64,
}

const DEFAULT_FUZZY_THRESHOLD: f64 = 0.85;

impl AliasTable {
    pub fn new(aliases: Vec<FieldAlias>) -> Result<Self, IngestError> {
        let mut scoped = HashMap::new();
        let mut global = HashMap::new();
        let mut entries = Vec::with_capacity(aliases.len());

        for alias in aliases {
            let normalized = normalize_header(&alias.alias);
            if normalized.is_empty() {
                return Err(IngestError::AliasInvalid(format!(
                    "alias for {} is empty after normalization",
                    alias.field
                )));
            }

            let replaced = match &alias.country {
                Some(country) => scoped
                    .insert((country.to_lowercase(), normalized.clone()), alias.field)
                    .is_some(),
                None => global.insert(normalized.clone(), alias.field).is_some(),
            };
            if replaced {
                return Err(IngestError::AliasInvalid(format!(
                    "duplicate alias '{}' in scope {}",
                    alias.alias,
                    alias.country.as_deref().unwrap_or("global")
                )));
            }

            entries.push(AliasEntry {
                raw: alias.alias,
                normalized,
                country: alias.country.map(|c| c.to_lowercase()),
                field: alias.field,
            });
        }

        Ok(AliasTable {
            scoped,
            global,
            entries,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        })
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// Map a raw column header to its canonical field, if any.
    ///
    /// Unmapped headers are legitimately dropped by callers, so "no match"
    /// is `None`, not an error.
    pub fn resolve(&self, raw_header: &str, country: Option<&str>) -> Option<CanonicalField> {
        let key = normalize_header(raw_header);
        if key.is_empty() {
            return None;
        }

        if let Some(c) = country {
            if let Some(field) = self.scoped.get(&(c.to_lowercase(), key.clone())) {
                return Some(*field);
            }
        }
        if let Some(field) = self.global.get(&key) {
            return Some(*field);
        }

        self.resolve_fuzzy(&key, country)
    }

    fn resolve_fuzzy(&self, key: &str, country: Option<&str>) -> Option<CanonicalField> {
        let country = country.map(|c| c.to_lowercase());
        let mut best: Option<(f64, CanonicalField)> = None;

        for entry in &self.entries {
            let in_scope = match &entry.country {
                None => true,
                Some(scope) => country.as_deref() == Some(scope.as_str()),
            };
            if !in_scope {
                continue;
            }
            let score = similarity(key, &entry.normalized);
            if score >= self.fuzzy_threshold && best.map_or(true, |(s, _)| score > s) {
                best = Some((score, entry.field));
            }
        }

        best.map(|(_, field)| field)
    }

    /// Raw spellings registered for a field, for out-of-band label scans.
    pub fn spellings_for(&self, field: CanonicalField) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.raw.as_str())
    }
}

/// Case-fold, strip trailing label punctuation, collapse whitespace.
fn normalize_header(s: &str) -> String {
    let trimmed = s.trim().trim_end_matches([':', '.']).to_lowercase();
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity between a normalized header and a normalized alias.
///
/// Bounded edit distance handles spelling drift; token-subset overlap
/// handles reordered or partially quoted multi-word headers. The strategy
/// lives behind this one function so it can be swapped without touching
/// callers.
fn similarity(a: &str, b: &str) -> f64 {
    let edit = strsim::normalized_levenshtein(a, b);
    let overlap = token_overlap(a, b);
    edit.max(overlap)
}

/// Overlap coefficient on whitespace tokens. Only meaningful for
/// multi-word headers; single-token inputs would make any superset match.
fn token_overlap(a: &str, b: &str) -> f64 {
    let ta: Vec<&str> = a.split_whitespace().collect();
    let tb: Vec<&str> = b.split_whitespace().collect();
    if ta.len() < 2 || tb.len() < 2 {
        return 0.0;
    }
    let shared = ta.iter().filter(|t| tb.contains(t)).count();
    shared as f64 / ta.len().min(tb.len()) as f64
}

/// Load an alias table from a JSON file.
pub fn load_alias_table(path: &Path) -> Result<AliasTable, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::AliasLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let def: AliasTableDef =
        serde_json::from_str(&content).map_err(|e| IngestError::AliasLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    AliasTable::new(def.aliases)
}

/// Parse an alias table from a JSON string.
pub fn parse_alias_table_str(json: &str) -> Result<AliasTable, IngestError> {
    let def: AliasTableDef = serde_json::from_str(json)?;
    AliasTable::new(def.aliases)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new(vec![
            FieldAlias {
                field: CanonicalField::ProductNo,
                alias: "Product No.".into(),
                country: None,
            },
            FieldAlias {
                field: CanonicalField::Price,
                alias: "Unit Price".into(),
                country: None,
            },
            FieldAlias {
                field: CanonicalField::Price,
                alias: "Betrag".into(),
                country: Some("de".into()),
            },
            FieldAlias {
                field: CanonicalField::Quantity,
                alias: "Betrag".into(),
                country: Some("at".into()),
            },
            FieldAlias {
                field: CanonicalField::DateFrom,
                alias: "Coverage Period from".into(),
                country: None,
            },
        ])
        .unwrap()
    }

    #[test]
    fn exact_match_is_case_and_punctuation_insensitive() {
        let t = table();
        assert_eq!(
            t.resolve("PRODUCT NO:", None),
            Some(CanonicalField::ProductNo)
        );
        assert_eq!(
            t.resolve("  product   no. ", None),
            Some(CanonicalField::ProductNo)
        );
    }

    #[test]
    fn country_scope_takes_precedence_and_falls_back() {
        let t = table();
        assert_eq!(t.resolve("Betrag", Some("de")), Some(CanonicalField::Price));
        assert_eq!(
            t.resolve("Betrag", Some("at")),
            Some(CanonicalField::Quantity)
        );
        // Unknown scope sees only global aliases; "Betrag" is not global.
        assert_eq!(t.resolve("Betrag", Some("se")), None);
        assert_eq!(
            t.resolve("Unit Price", Some("de")),
            Some(CanonicalField::Price)
        );
    }

    #[test]
    fn fuzzy_match_tolerates_small_drift() {
        let t = table();
        assert_eq!(
            t.resolve("Coverage period from:", None),
            Some(CanonicalField::DateFrom)
        );
        assert_eq!(
            t.resolve("Coverage Periods from", None),
            Some(CanonicalField::DateFrom)
        );
    }

    #[test]
    fn unrelated_header_does_not_match() {
        let t = table();
        assert_eq!(t.resolve("Warranty Level", None), None);
        assert_eq!(t.resolve("", None), None);
    }

    #[test]
    fn resolution_is_idempotent() {
        let t = table();
        let first = t.resolve("Coverage period from", None);
        let second = t.resolve("Coverage period from", None);
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_alias_in_scope_is_rejected() {
        let result = AliasTable::new(vec![
            FieldAlias {
                field: CanonicalField::Price,
                alias: "Price".into(),
                country: None,
            },
            FieldAlias {
                field: CanonicalField::Quantity,
                alias: "price:".into(),
                country: None,
            },
        ]);
        assert!(matches!(result, Err(IngestError::AliasInvalid(_))));
    }

    #[test]
    fn same_alias_in_different_scopes_is_fine() {
        // The fixture itself carries "Betrag" in both de and at scopes.
        table();
    }

    #[test]
    fn single_token_headers_do_not_fuzzy_match_supersets() {
        let t = AliasTable::new(vec![FieldAlias {
            field: CanonicalField::Price,
            alias: "Price".into(),
            country: None,
        }])
        .unwrap();
        assert_eq!(t.resolve("Price list overview", None), None);
    }
}
