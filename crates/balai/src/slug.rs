//! URL slugs for news items.

use std::sync::OnceLock;

use regex::Regex;

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 80;

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9\s-]").expect("slug charset regex is valid"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

/// Derive a URL-safe slug from a news title.
///
/// Lower-cases the title, drops everything outside `[a-z0-9]`, whitespace and
/// `-`, trims, joins whitespace runs with a single hyphen and truncates to
/// [`MAX_SLUG_LEN`] characters. Slugs are not unique: different titles may
/// normalize to the same value.
#[must_use]
pub fn make_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = disallowed_chars().replace_all(&lowered, "");
    let hyphenated = whitespace_runs().replace_all(stripped.trim(), "-");
    hyphenated.chars().take(MAX_SLUG_LEN).collect()
}
