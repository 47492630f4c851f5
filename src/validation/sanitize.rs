//! HTML sanitization for free-text display.

use regex::Regex;
use std::sync::OnceLock;

// Matches a well-formed entity at the start of the slice: named, decimal or
// hex. Ampersands already starting one of these are left alone so repeated
// sanitization does not double-escape.
fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]{1,31}|#[0-9]{1,7}|#x[0-9A-Fa-f]{1,6});").expect("entity pattern")
    })
}

/// Escape the five HTML-significant characters for safe text-node display.
///
/// Replacement is non-overlapping: an `&` that already begins an entity is
/// preserved, everything else becomes its entity form.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => {
                if entity_pattern().is_match(&input[i..]) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_markup() {
        assert_eq!(
            sanitize_html("<script>a&b</script>"),
            "&lt;script&gt;a&amp;b&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escapes_quotes() {
        assert_eq!(sanitize_html(r#"a"b'c"#), "a&quot;b&#x27;c");
    }

    #[test]
    fn test_existing_entities_untouched() {
        assert_eq!(sanitize_html("a&amp;b"), "a&amp;b");
        assert_eq!(sanitize_html("&#39; &#x27; &lt;"), "&#39; &#x27; &lt;");
    }

    #[test]
    fn test_idempotent() {
        let once = sanitize_html("<a href=\"x\">&'</a>");
        assert_eq!(sanitize_html(&once), once);
    }

    #[test]
    fn test_bare_ampersand_escaped() {
        assert_eq!(sanitize_html("fish & chips"), "fish &amp; chips");
        // `&` followed by entity-ish text without the semicolon is bare.
        assert_eq!(sanitize_html("&ampx"), "&amp;ampx");
    }
}
