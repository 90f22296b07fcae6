//! Free-text sanitization
//!
//! Markup is removed with `ammonia` (no tag allowed), then quotes are encoded
//! so the stored value can be echoed back inside HTML attributes.

use ammonia::Builder;
use std::collections::HashSet;

/// Sanitize a free-text form value.
///
/// - Tags are dropped and their text kept; `script`/`style` lose their content
/// - A `<` that does not open a tag (`a < b`) stays as text
/// - Entities are not decoded: `&amp;` is stored as typed
/// - `"` becomes `&#34;` and `'` becomes `&#39;`
/// - NUL and other ASCII control characters are removed, except tab and
///   newlines; CR and CRLF are normalized to LF by the HTML parser
///
/// Never fails: an empty input yields an empty output.
pub fn sanitize_text(input: &str) -> String {
    let text: String = input
        .chars()
        .filter(|&c| !c.is_ascii_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();

    // Escape `&` up front so entities in the input survive parsing as text
    let escaped = text.replace('&', "&amp;");

    let cleaned = Builder::default()
        .tags(HashSet::new())
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(&escaped)
        .to_string();

    encode_quotes(&unescape_text(&cleaned))
}

/// Undo the serializer's text escaping; `&amp;` must go last
fn unescape_text(serialized: &str) -> String {
    serialized
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn encode_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
