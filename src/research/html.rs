//! HTML to readable text.

use regex::{Captures, Regex};
use std::sync::OnceLock;

struct HtmlPatterns {
    hidden: Regex,
    comment: Regex,
    block_break: Regex,
    tag: Regex,
    entity: Regex,
    spaces: Regex,
}

fn patterns() -> &'static HtmlPatterns {
    static PATTERNS: OnceLock<HtmlPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| HtmlPatterns {
        hidden: Regex::new(
            r"(?is)<(?:script|style|noscript|svg|head)\b[^>]*>.*?</(?:script|style|noscript|svg|head)\s*>",
        )
        .expect("Invalid regex"),
        comment: Regex::new(r"(?s)<!--.*?-->").expect("Invalid regex"),
        block_break: Regex::new(r"(?i)<(?:br|/p|/div|/li|/tr|/h[1-6]|/section|/article|/table)\b[^>]*>")
            .expect("Invalid regex"),
        tag: Regex::new(r"(?s)<[^>]+>").expect("Invalid regex"),
        entity: Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("Invalid regex"),
        spaces: Regex::new(r"[ \t\u{a0}]+").expect("Invalid regex"),
    })
}

/// Reduce an HTML document to plain text, one block per line.
pub fn html_to_text(html: &str) -> String {
    let p = patterns();

    let text = p.hidden.replace_all(html, " ");
    let text = p.comment.replace_all(&text, " ");
    let text = p.block_break.replace_all(&text, "\n");
    let text = p.tag.replace_all(&text, " ");
    let text = decode_entities(&text);

    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let collapsed = p.spaces.replace_all(line, " ");
        let trimmed = collapsed.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    lines.join("\n")
}

/// Decode named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    patterns()
        .entity
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    "ndash" => Some('\u{2013}'),
                    "mdash" => Some('\u{2014}'),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
