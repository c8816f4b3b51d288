use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("non-slug regex"));
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("separator regex"));

/// Lowercase, hyphen-separated address form. Unicode input is NFKC-normalized; with
/// `allow_unicode = false` it is NFKD-decomposed and reduced to ASCII instead.
pub fn slugify(value: &str, allow_unicode: bool) -> String {
    let value: String = if allow_unicode {
        value.nfkc().collect()
    } else {
        value.nfkd().filter(char::is_ascii).collect()
    };
    let lowered = value.to_lowercase();
    let cleaned = NON_SLUG_RE.replace_all(&lowered, "");
    let dashed = SEPARATOR_RE.replace_all(&cleaned, "-");
    dashed.trim_matches(|c| c == '-' || c == '_').to_string()
}

#[cfg(test)]
mod tests {
    use super::slugify;

    #[test]
    fn basic_slugs() {
        assert_eq!(slugify("Hello, World!", true), "hello-world");
        assert_eq!(slugify("  --Already-slugged--  ", true), "already-slugged");
        assert_eq!(slugify("a _ b", true), "a-_-b");
        assert_eq!(slugify("__x__", true), "x");
    }

    #[test]
    fn unicode_handling() {
        assert_eq!(slugify("Café Crème", true), "café-crème");
        assert_eq!(slugify("Café Crème", false), "cafe-creme");
        assert_eq!(slugify("Привет", false), "");
        assert_eq!(slugify("Привет мир", true), "привет-мир");
        assert_eq!(slugify("!!!", true), "");
    }

    #[test]
    fn normalizes_decomposed_and_compatibility_forms() {
        assert_eq!(slugify("Cafe\u{301}", true), "caf\u{e9}");
        assert_eq!(slugify("Cafe\u{301}", false), "cafe");
        assert_eq!(slugify("\u{fb01}n de l\u{2019}\u{e9}t\u{e9}", true), "fin-de-l\u{e9}t\u{e9}");
        assert_eq!(slugify("\u{ff21}\u{ff22}\u{ff23}", false), "abc");
    }
}
