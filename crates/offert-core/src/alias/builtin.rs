use crate::alias::{parse_alias_table_str, AliasTable};
use crate::error::IngestError;

const BUILTIN_ALIASES_JSON: &str = include_str!("../../../../aliases/builtin.json");

/// The alias table shipped with the engine: English global aliases plus
/// country-scoped vendor spellings (de, se, nl, fr).
///
/// Callers with vendor-specific alias data load their own table and use
/// this one as a baseline.
pub fn builtin_alias_table() -> Result<AliasTable, IngestError> {
    parse_alias_table_str(BUILTIN_ALIASES_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CanonicalField;

    #[test]
    fn builtin_table_parses() {
        let table = builtin_alias_table().unwrap();
        assert_eq!(
            table.resolve("Product No.", None),
            Some(CanonicalField::ProductNo)
        );
        assert_eq!(table.resolve("Qty", None), Some(CanonicalField::Quantity));
    }

    #[test]
    fn builtin_country_scopes_resolve() {
        let table = builtin_alias_table().unwrap();
        assert_eq!(
            table.resolve("Menge", Some("de")),
            Some(CanonicalField::Quantity)
        );
        assert_eq!(
            table.resolve("Benämning", Some("se")),
            Some(CanonicalField::Description)
        );
        // German headers are invisible without the scope.
        assert_eq!(table.resolve("Menge", None), None);
    }
}
