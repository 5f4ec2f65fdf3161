//! HTML element classification helpers.
//!
//! - `is_void_element()` - elements that never have an end tag (br, link, ...)
//! - `is_raw_text_element()` - elements whose content is raw text (script, style)
//! - `preserves_whitespace()` - elements whose content must not be reflowed

/// Check if an HTML tag is a void element (no end tag, no children).
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content is never markup).
///
/// Per HTML spec: script and style content is "raw text". The tokenizer
/// scans their content for the matching end tag instead of nested markup.
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

/// Check if the content of a tag is whitespace-sensitive.
///
/// The formatter leaves these verbatim instead of collapsing or indenting.
#[inline]
pub fn preserves_whitespace(tag: &str) -> bool {
    is_raw_text_element(tag) || tag.eq_ignore_ascii_case("pre") || tag.eq_ignore_ascii_case("textarea")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_elements() {
        assert!(is_void_element("br"));
        assert!(is_void_element("link"));
        assert!(is_void_element("meta"));
        assert!(!is_void_element("div"));
        assert!(!is_void_element("script"));
    }

    #[test]
    fn test_raw_text_elements() {
        assert!(is_raw_text_element("script"));
        assert!(is_raw_text_element("STYLE"));
        assert!(!is_raw_text_element("div"));
    }

    #[test]
    fn test_preserves_whitespace() {
        assert!(preserves_whitespace("pre"));
        assert!(preserves_whitespace("textarea"));
        assert!(preserves_whitespace("script"));
        assert!(!preserves_whitespace("p"));
    }
}
