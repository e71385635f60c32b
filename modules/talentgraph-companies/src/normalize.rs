//! Name canonicalization for company comparison.

/// Legal-entity suffixes stripped from the end of a normalized name.
/// Matched as a whole trailing token (preceded by a space); at most one is
/// removed even when several would apply.
const LEGAL_SUFFIXES: &[&str] = &[
    "incorporated",
    "corporation",
    "l.l.c.",
    "limited",
    "company",
    "inc.",
    "corp.",
    "ltd.",
    "inc",
    "corp",
    "ltd",
    "llc",
    "co.",
    "co",
];

/// Canonicalize a company display name for comparison: lowercase, collapse
/// whitespace, trim, strip one leading "the " and one trailing legal
/// suffix. Pure; the stored display name is never rewritten.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(rest) = collapsed.strip_prefix("the ") {
        collapsed = rest.to_string();
    }

    for suffix in LEGAL_SUFFIXES {
        if let Some(rest) = collapsed.strip_suffix(suffix) {
            if let Some(stem) = rest.strip_suffix(' ') {
                if !stem.is_empty() {
                    return stem.to_string();
                }
            }
        }
    }

    collapsed
}
