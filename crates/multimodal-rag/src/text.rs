//! Text normalization helpers shared by ingestion and answering

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+").expect("valid regex"));

/// Collapse whitespace, drop URLs and trim.
///
/// Whitespace is collapsed before URLs are removed, so a removed URL can
/// leave a double space behind. That matches how retrieved context and
/// generated answers have always been cleaned.
pub fn clean_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let without_urls = URL.replace_all(&collapsed, "");
    without_urls.trim().to_string()
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Preview of `text`: the first `max_chars` characters plus `...` when longer
pub fn content_sample(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", truncate_chars(text, max_chars))
    } else {
        text.to_string()
    }
}
