use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```json[ \t]*\r?\n(.*?)\r?\n[ \t]*```").expect("fence pattern is valid")
});

/// Locate the JSON-looking part of a model response.
///
/// First match wins: a fenced block labeled `json`, then the first
/// brace-delimited span, then the whole trimmed text. Purely syntactic,
/// the result may still fail to parse.
pub fn extract_json_candidate(text: &str) -> &str {
    if let Some(body) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
        return body.as_str().trim();
    }

    if let Some(span) = first_brace_span(text) {
        return span.trim();
    }

    text.trim()
}

/// Balanced `{...}` span starting at the first `{`, skipping braces inside
/// string literals. Unbalanced input falls back to first `{` .. last `}`.
fn first_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
