use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref URL_PATTERN: Regex =
        Regex::new(r"(?i)(https?://[^\s]+|www\.[^\s]+)").expect("URL pattern is valid");
}

/// Extract URL-shaped substrings from message body text.
///
/// Matches `http://`/`https://`-prefixed tokens and bare `www.`-prefixed
/// tokens up to the next whitespace, case-insensitively. Matches are
/// returned in order of appearance and are not deduplicated; every
/// occurrence in the text is reported.
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
