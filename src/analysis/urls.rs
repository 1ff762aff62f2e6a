//! URL extraction from message bodies.

use std::sync::LazyLock;

use regex::Regex;

/// An `http(s)` URL up to the first terminator a mail body uses: a closing
/// angle bracket, a space, or a blank line. A URL at the very end of the
/// body with no terminator is not captured.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)(https?://.*?)(?:>| |(?:\r\n){2})").unwrap_or_else(|e| panic!("url regex: {e}"))
});

/// Every URL in `body`, in order of appearance, duplicates kept. Soft line
/// breaks inside a wrapped URL are removed.
pub fn extract_urls(body: &str) -> Vec<String> {
    URL_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace("\r\n", ""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_bracket_terminates_url() {
        assert_eq!(
            extract_urls("click http://example.com/a>more text"),
            vec!["http://example.com/a"]
        );
    }

    #[test]
    fn test_space_terminates_url() {
        assert_eq!(
            extract_urls("see https://example.com/path now"),
            vec!["https://example.com/path"]
        );
    }

    #[test]
    fn test_blank_line_terminates_and_wraps_are_joined() {
        let body = "see https://example.com/pa\r\nth/x\r\n\r\nregards";
        assert_eq!(extract_urls(body), vec!["https://example.com/path/x"]);
    }

    #[test]
    fn test_unterminated_url_is_not_captured() {
        assert!(extract_urls("go to http://example.com").is_empty());
    }

    #[test]
    fn test_order_preserved_and_duplicates_kept() {
        let body = "a http://one.example/ b http://two.example/ c http://one.example/ d";
        assert_eq!(
            extract_urls(body),
            vec![
                "http://one.example/",
                "http://two.example/",
                "http://one.example/",
            ]
        );
    }

    #[test]
    fn test_no_links() {
        assert!(extract_urls("").is_empty());
        assert!(extract_urls("plain text only").is_empty());
    }
}
