//! Company name → Endole URL slug
//!
//! Endole addresses a company page as `/company/{number}/{slug}`, where the
//! slug is a canonical, hyphenated form of the registered name.

/// Derive the URL path slug for a company display name.
///
/// Steps are applied in order, each on the output of the previous one:
/// trim + lowercase, `&` → `and`, drop `,` `.` `'` `’`, collapse whitespace
/// runs into single hyphens.
pub fn derive_slug(display_name: &str) -> String {
    let lowered = display_name.trim().to_lowercase();
    let expanded = lowered.replace('&', "and");
    let stripped: String = expanded
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | '\'' | '\u{2019}'))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("O'Brien & Sons, Ltd.", "obrien-and-sons-ltd")]
    #[case("Acme & Co", "acme-and-co")]
    #[case("  TESCO PLC  ", "tesco-plc")]
    #[case("Marks\u{2019}s   Holdings\tLimited", "markss-holdings-limited")]
    #[case("A.B.C. Trading", "abc-trading")]
    #[case("AT&T", "atandt")]
    fn test_derive_slug_cases(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(derive_slug(input), expected);
    }

    #[test]
    fn test_slug_of_slug_is_unchanged() {
        let once = derive_slug("Smith, Jones & Partners LLP");
        assert_eq!(once, "smith-jones-and-partners-llp");
        assert_eq!(derive_slug(&once), once);
    }

    proptest! {
        #[test]
        fn prop_derive_slug_is_idempotent(name in "\\PC{1,40}") {
            let once = derive_slug(&name);
            prop_assert_eq!(derive_slug(&once), once);
        }

        #[test]
        fn prop_slug_has_no_whitespace_or_punctuation(name in "[A-Za-z0-9&,.' \u{2019}]{1,40}") {
            let slug = derive_slug(&name);
            prop_assert!(!slug.chars().any(|c| c.is_whitespace()));
            prop_assert!(!slug.contains(['&', ',', '.', '\'', '’']));
        }
    }
}
