//! Normalisation of model replies into exact-match answers.

use regex::Regex;
use std::sync::OnceLock;

fn marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?i)final\s+answer\s*:").expect("Invalid regex"))
}

/// Extract the answer from a model reply.
///
/// Uses the text after the last `FINAL ANSWER:` marker, or the last non-empty line
/// when the marker is missing, and strips formatting that would break exact matching.
pub fn extract_final_answer(raw: &str) -> String {
    let tail = match marker().find_iter(raw).last() {
        Some(m) => &raw[m.end()..],
        None => raw.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or(""),
    };

    let line = tail
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");

    clean_answer(line)
}

fn clean_answer(answer: &str) -> String {
    let mut current = answer.trim();
    let mut period_stripped = false;

    loop {
        let before = current;
        current = current.trim_matches(|c: char| c == '*' || c == '`').trim();
        if !period_stripped {
            if let Some(rest) = current.strip_suffix('.') {
                if !rest.ends_with('.') {
                    current = rest.trim_end();
                    period_stripped = true;
                }
            }
        }
        for (open, close) in [('"', '"'), ('\'', '\''), ('\u{201c}', '\u{201d}'), ('[', ']')] {
            current = strip_pair(current, open, close);
        }
        if current == before {
            break;
        }
    }

    current.to_string()
}

fn strip_pair(text: &str, open: char, close: char) -> &str {
    match text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
        Some(inner) => inner.trim(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_after_marker() {
        let raw = "Facts given: ...\nPlan: count albums.\n\nFINAL ANSWER: 3";
        assert_eq!(extract_final_answer(raw), "3");
    }

    #[test]
    fn test_uses_last_marker_case_insensitive() {
        let raw = "I must end with FINAL ANSWER: <answer>.\nfinal answer:  Paris ";
        assert_eq!(extract_final_answer(raw), "Paris");
    }

    #[test]
    fn test_answer_on_next_line() {
        assert_eq!(extract_final_answer("FINAL ANSWER:\n\n  right\n"), "right");
    }

    #[test]
    fn test_falls_back_to_last_line() {
        assert_eq!(extract_final_answer("Thinking...\nThe answer is below\n42\n\n"), "42");
    }

    #[test]
    fn test_strips_formatting() {
        assert_eq!(extract_final_answer("FINAL ANSWER: **Paris**."), "Paris");
        assert_eq!(extract_final_answer("FINAL ANSWER: `b, e`"), "b, e");
        assert_eq!(extract_final_answer("FINAL ANSWER: \"Saint Petersburg\""), "Saint Petersburg");
        assert_eq!(extract_final_answer("FINAL ANSWER: [a, b, c]"), "a, b, c");
        assert_eq!(extract_final_answer("FINAL ANSWER: $89,706.00."), "$89,706.00");
    }

    #[test]
    fn test_period_outside_or_inside_wrappers() {
        assert_eq!(extract_final_answer("FINAL ANSWER: **Paris**."), "Paris");
        assert_eq!(extract_final_answer("FINAL ANSWER: **Paris.**"), "Paris");
        assert_eq!(extract_final_answer("FINAL ANSWER: \"Oslo\"."), "Oslo");
        assert_eq!(extract_final_answer("FINAL ANSWER: `*St. Louis.*`."), "St. Louis.");
    }

    #[test]
    fn test_keeps_ellipsis_and_inner_quotes() {
        assert_eq!(extract_final_answer("FINAL ANSWER: wait..."), "wait...");
        assert_eq!(extract_final_answer("FINAL ANSWER: Rock 'n' Roll"), "Rock 'n' Roll");
    }

    #[test]
    fn test_empty_reply() {
        assert_eq!(extract_final_answer(""), "");
    }
}
