use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static SYMBOL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{S}").unwrap());
static STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s_]+").unwrap());

/// Turn a category display name into the path segment used by the directory URL.
///
/// Never fails; an all-symbol name comes back as an empty string.
pub fn slugify(name: &str) -> String {
    let without_symbols = SYMBOL_RE.replace_all(name, "");
    let ascii: String = without_symbols.nfkd().filter(char::is_ascii).collect();
    let lower = ascii.to_lowercase();
    let stripped = STRIP_RE.replace_all(&lower, "");
    SEPARATOR_RE
        .replace_all(&stripped, "-")
        .trim_matches('-')
        .to_string()
}
