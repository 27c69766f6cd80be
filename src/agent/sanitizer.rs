// Deny-list filter applied to user text before it reaches any prompt.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Replacement for every deny-listed match.
pub const FILTER_TOKEN: &str = "[FILTERED]";

/// Role labels, code fences, JSON-looking spans, URLs, stray braces and the
/// prompt's own data delimiters. Order matters: ```json before bare ```,
/// brace spans before single braces.
const DENY_PATTERNS: &[&str] = &[
    r"system:",
    r"user:",
    r"assistant:",
    r"```json",
    r"```",
    r"\{.*\}",
    r"[{}]",
    r"https?://\S+",
    r"</?user_description>",
];

static DENY_REGEX: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!("(?is){}", DENY_PATTERNS.join("|"));
    Regex::new(&pattern).expect("deny-list patterns are valid")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strip injection-prone substrings from raw user input, then collapse
/// whitespace runs to a single space and trim.
pub fn sanitize_input(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let filtered_count = DENY_REGEX.find_iter(text).count();
    if filtered_count > 0 {
        warn!(
            filtered = filtered_count,
            "Deny-listed patterns removed from user input"
        );
    }

    let filtered = DENY_REGEX.replace_all(text, FILTER_TOKEN);
    WHITESPACE_RUN.replace_all(&filtered, " ").trim().to_string()
}
