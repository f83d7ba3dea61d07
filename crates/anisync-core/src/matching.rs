use anisync_models::CatalogEntry;

/// Lowercase alphanumerics only: "Re:Zero - Starting Life" -> "rezerostartinglife"
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Equal ignoring case and symbols; empty titles never match
pub fn titles_equal(a: &str, b: &str) -> bool {
    let a = normalize_title(a);
    !a.is_empty() && a == normalize_title(b)
}

/// `needle` appears inside `haystack` ignoring case and symbols
pub fn contains_ignoring_symbols(haystack: &str, needle: &str) -> bool {
    let needle = normalize_title(needle);
    !needle.is_empty() && normalize_title(haystack).contains(&needle)
}

pub fn title_matches(entry: &CatalogEntry, name: &str) -> bool {
    entry.all_titles().any(|title| titles_equal(title, name))
}

/// First search candidate known by `name` under any of its titles
pub fn find_match<'a>(candidates: &'a [CatalogEntry], name: &str) -> Option<&'a CatalogEntry> {
    candidates.iter().find(|entry| title_matches(entry, name))
}
