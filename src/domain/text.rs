//! Plain-text rendering of editor markup

use regex::Regex;
use std::sync::OnceLock;

fn block_break_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|blockquote|pre)\s*>")
            .unwrap()
    })
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn blank_lines_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

/// Strip HTML tags from editor content.
///
/// Block-level closings and `<br>` become line breaks, common entities are
/// decoded, and runs of blank lines collapse to one.
pub fn strip_html(markup: &str) -> String {
    let with_breaks = block_break_regex().replace_all(markup, "\n");
    let without_tags = tag_regex().replace_all(&with_breaks, "");
    let decoded = decode_entities(&without_tags);

    let lines: Vec<&str> = decoded.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    blank_lines_regex()
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

fn decode_entities(text: &str) -> String {
    // &amp; last so "&amp;lt;" stays "&lt;"
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
