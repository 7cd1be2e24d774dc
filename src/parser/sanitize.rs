//! Review text cleanup
//!
//! Review bodies arrive as lightly marked-up HTML fragments. They are turned
//! into plain text by decoding entities and converting line-break tags into
//! literal newlines. No other tags are touched.

use regex::Regex;
use std::sync::LazyLock;

static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

/// Decode HTML entities, then turn `<br>`-style tags into `\n`
///
/// Entity decoding happens first, so an escaped `&lt;br/&gt;` in the body
/// also becomes a newline.
///
/// # Examples
///
/// ```
/// use marquee::parser::sanitize::clean_review_text;
///
/// assert_eq!(clean_review_text("It&#39;s good<br/>Really"), "It's good\nReally");
/// assert_eq!(clean_review_text("A &amp; B<BR>C"), "A & B\nC");
/// ```
pub fn clean_review_text(raw: &str) -> String {
    let decoded = decode_entities(raw);
    normalize_line_breaks(&decoded)
}

/// Decode named and numeric HTML entities
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Replace `<br>`, `<br/>` and `<br />` (any case) with a newline
pub fn normalize_line_breaks(text: &str) -> String {
    LINE_BREAK_REGEX.replace_all(text, "\n").into_owned()
}
