//! Markdown code-fence stripping for generated text.
//!
//! Only column-0 fences count. OpenAPI descriptions may carry their own
//! Markdown fences, but those sit inside indented block scalars.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Opening fence at the very start, with an optional yaml/yml/json info string.
    static ref LEADING_FENCE: Regex = Regex::new(r"^```[ \t]*(?:ya?ml|json)?[ \t]*\r?\n").unwrap();

    // Closing fence that ends the text.
    static ref TRAILING_FENCE: Regex = Regex::new(r"\s*```$").unwrap();

    // Opening fence on its own line somewhere after leading prose.
    static ref EMBEDDED_FENCE: Regex =
        Regex::new(r"(?m)^```[ \t]*(?:ya?ml|json)?[ \t]*\r?\n").unwrap();

    // A bare closing fence line.
    static ref CLOSING_LINE: Regex = Regex::new(r"(?m)^```[ \t]*\r?$").unwrap();
}

/// Cut `body` at its closing fence: a fence ending the text, else the last
/// bare fence line. An unterminated body is returned whole.
fn before_closing_fence(body: &str) -> &str {
    if let Some(close) = TRAILING_FENCE.find(body) {
        return &body[..close.start()];
    }
    match CLOSING_LINE.find_iter(body).last() {
        Some(close) => &body[..close.start()],
        None => body,
    }
}

/// Extract the document from generator output.
///
/// - Text opening with a fence loses that fence and its closing fence.
/// - Otherwise the first column-0 fenced block after leading prose is
///   extracted, up to the last closing fence.
/// - Otherwise the trimmed text is returned unchanged.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(open) = LEADING_FENCE.find(trimmed) {
        return before_closing_fence(&trimmed[open.end()..])
            .trim_end()
            .to_string();
    }

    if let Some(open) = EMBEDDED_FENCE.find(trimmed) {
        let body = &trimmed[open.end()..];
        if let Some(close) = CLOSING_LINE.find_iter(body).last() {
            return body[..close.start()].trim_end().to_string();
        }
    }

    trimmed.to_string()
}
