//! Identifier case conversion: view names are snake_case (`by_slug`), config keys and
//! accessor aliases may be camelCase (`bySlug`, `findOneBySlug`).

/// Convert a single identifier from snake_case to camelCase.
/// e.g. "by_slug" -> "bySlug", "by_one_of_the_tags" -> "byOneOfTheTags"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "bySlug" -> "by_slug", "findOneByID" -> "find_one_by_i_d"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// True when `alias` names `canonical` in either case convention.
pub fn same_identifier(canonical: &str, alias: &str) -> bool {
    canonical == alias || to_snake_case(alias) == canonical || to_camel_case(canonical) == alias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_view_names_both_ways() {
        assert_eq!(to_camel_case("by_one_of_the_tags"), "byOneOfTheTags");
        assert_eq!(to_snake_case("byOneOfTheTags"), "by_one_of_the_tags");
        assert_eq!(to_camel_case("by_slug"), "bySlug");
        assert_eq!(to_snake_case("by_slug"), "by_slug");
    }

    #[test]
    fn same_identifier_accepts_either_spelling() {
        assert!(same_identifier("by_slug", "by_slug"));
        assert!(same_identifier("by_slug", "bySlug"));
        assert!(!same_identifier("by_slug", "byTag"));
    }
}
