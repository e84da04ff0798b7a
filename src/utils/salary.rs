/// Historical bracket spellings mapped onto the current canonical set.
///
/// Wide legacy ranges land on the higher, narrower canonical bracket they overlap.
pub const LEGACY_SALARY_BRACKETS: &[(&str, &str)] = &[
    ("0-1500", "1001-1500"),
    ("1000-1500", "1001-1500"),
    ("1000-2000", "1501-2000"),
    ("1001-2000", "1501-2000"),
    ("1500-2000", "1501-2000"),
    ("2000-2500", "2001-2500"),
    ("2000-3000", "2501-3000"),
    ("2001-3000", "2501-3000"),
    ("2500-3000", "2501-3000"),
    ("3000-4000", "3001-4000"),
    ("3000-5000", "4001-5000"),
    ("3001-5000", "4001-5000"),
    ("4000-5000", "4001-5000"),
    ("5000+", "5001+"),
    ("5000-plus", "5001+"),
    ("above-5000", "5001+"),
];

/// Maps a legacy bracket onto its canonical spelling. Unknown values are returned unchanged.
pub fn normalize_salary(raw: &str) -> String {
    let trimmed = raw.trim();
    LEGACY_SALARY_BRACKETS
        .iter()
        .find(|(legacy, _)| *legacy == trimmed)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bracket::SalaryBracket;

    #[test]
    fn combined_bracket_rounds_up() {
        assert_eq!(normalize_salary("2001-3000"), "2501-3000");
        assert_eq!(normalize_salary("3001-5000"), "4001-5000");
    }

    #[test]
    fn normalization_is_a_fixed_point() {
        for (legacy, _) in LEGACY_SALARY_BRACKETS {
            let once = normalize_salary(legacy);
            assert_eq!(normalize_salary(&once), once, "not stable for {legacy}");
        }
    }

    #[test]
    fn every_mapping_lands_on_a_canonical_bracket() {
        for (legacy, canonical) in LEGACY_SALARY_BRACKETS {
            assert!(
                canonical.parse::<SalaryBracket>().is_ok(),
                "{legacy} maps to unknown bracket {canonical}"
            );
        }
    }

    #[test]
    fn unmapped_values_pass_through() {
        assert_eq!(normalize_salary("negotiable"), "negotiable");
        assert_eq!(normalize_salary("2501-3000"), "2501-3000");
        assert_eq!(normalize_salary(""), "");
    }
}
