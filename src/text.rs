use chrono::{DateTime, Local, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<p\s*/?>|<br\s*/?>").expect("valid paragraph regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Turns an HN body (a small HTML subset) into plain text.
pub fn plain(html: &str) -> String {
    let with_breaks = PARAGRAPH_RE.replace_all(html, "\n\n");
    let stripped = TAG_RE.replace_all(&with_breaks, "");
    html_escape::decode_html_entities(&stripped).trim().to_string()
}

/// Local wall-clock rendering of an API timestamp (unix seconds).
pub fn timestamp(secs: Option<i64>) -> String {
    secs.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

/// Single upper-case letter standing in for an author's picture.
pub fn avatar(author: &str) -> String {
    author
        .chars()
        .next()
        .map(|ch| ch.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}
