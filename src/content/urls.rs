//! URL detection in question text.

use super::attachment::MediaKind;
use regex::Regex;
use url::Url;

/// Detects and extracts URLs from free text.
pub struct UrlDetector {
    url_regex: Regex,
}

impl Default for UrlDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlDetector {
    pub fn new() -> Self {
        // Scheme-prefixed URLs first, then www. hosts, then bare domains with an optional path.
        // The bare TLD must end on a word boundary so `pie.mp3` never yields `pie.mp`.
        let url_regex = Regex::new(
            r#"(?xi)
            (?:https?|ftp|file)://[^\s<>"{}|\\^`\[\]]+
            |
            www\.[^\s<>"{}|\\^`\[\]]+
            |
            (?:[\w-]+\.)+[a-z]{2,}\b(?:/[^\s<>"{}|\\^`\[\]]*)?
            "#,
        )
        .expect("Invalid regex");

        Self { url_regex }
    }

    /// Extract all URLs from text, normalized and de-duplicated in order of appearance.
    pub fn extract_urls(&self, text: &str) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();

        for m in self.url_regex.find_iter(text) {
            let candidate = trim_trailing_punctuation(m.as_str());
            let has_scheme = candidate.contains("://");

            if !has_scheme && !candidate.to_lowercase().starts_with("www.") && looks_like_file(candidate) {
                continue;
            }

            let normalized = if has_scheme {
                candidate.to_string()
            } else {
                format!("https://{}", candidate)
            };

            if is_valid(&normalized) && !urls.contains(&normalized) {
                urls.push(normalized);
            }
        }

        urls
    }

    /// Check if text contains any URLs.
    pub fn contains_urls(&self, text: &str) -> bool {
        !self.extract_urls(text).is_empty()
    }
}

/// Drop sentence punctuation glued to the end of a URL, keeping balanced parentheses.
fn trim_trailing_punctuation(candidate: &str) -> &str {
    let mut s = candidate;
    loop {
        let Some(last) = s.chars().last() else {
            return s;
        };
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '\'' | '"' => true,
            ')' => s.matches('(').count() < s.matches(')').count(),
            _ => false,
        };
        if !strip {
            return s;
        }
        s = &s[..s.len() - last.len_utf8()];
    }
}

/// Bare "name.ext" tokens such as `notes.txt` or `song.mp3` are file names, not hosts.
fn looks_like_file(candidate: &str) -> bool {
    if candidate.contains('/') {
        return false;
    }
    candidate
        .rsplit('.')
        .next()
        .is_some_and(|ext| MediaKind::from_extension(ext) != MediaKind::Other || is_document_ext(ext))
}

fn is_document_ext(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "zip" | "pdb"
    )
}

fn is_valid(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => url.scheme() == "file" || url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_scheme_urls() {
        let detector = UrlDetector::new();
        let urls = detector.extract_urls(
            "Watch https://www.youtube.com/watch?v=L1vXCYZAYYM and tell me the first animal.",
        );
        assert_eq!(urls, vec!["https://www.youtube.com/watch?v=L1vXCYZAYYM"]);
    }

    #[test]
    fn test_adds_scheme_to_bare_hosts() {
        let detector = UrlDetector::new();
        let urls = detector.extract_urls("See www.example.org/page, or arxiv.org/abs/2106.00001.");
        assert_eq!(
            urls,
            vec![
                "https://www.example.org/page",
                "https://arxiv.org/abs/2106.00001"
            ]
        );
    }

    #[test]
    fn test_keeps_balanced_parentheses() {
        let detector = UrlDetector::new();
        let urls = detector
            .extract_urls("(source: https://en.wikipedia.org/wiki/Mercedes_Sosa_(singer))");
        assert_eq!(urls, vec!["https://en.wikipedia.org/wiki/Mercedes_Sosa_(singer)"]);
    }

    #[test]
    fn test_deduplicates_in_order() {
        let detector = UrlDetector::new();
        let urls = detector.extract_urls("https://a.com then https://b.com then https://a.com");
        assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn test_ignores_file_names_and_numbers() {
        let detector = UrlDetector::new();
        assert!(detector
            .extract_urls("Open the attached file data.xlsx and add 3.14 to the total, e.g. twice.")
            .is_empty());
        assert!(!detector.contains_urls("Attached: recipe.mp3"));
        assert!(detector.contains_urls("file:///tmp/notes.txt"));
    }

    #[test]
    fn test_media_names_with_digits_are_not_hosts() {
        let detector = UrlDetector::new();
        for text in [
            "I've attached Strawberry pie.mp3 with the recipe.",
            "Listen to Homework.mp3 and list the pages.",
            "The clip is in lecture.mp4, the memo in voice.m4a.",
            "See phone.3gp for the video.",
        ] {
            assert!(detector.extract_urls(text).is_empty(), "{}", text);
        }
        assert_eq!(
            detector.extract_urls("Compare pie.mp3 with example.com/pie."),
            vec!["https://example.com/pie"]
        );
    }
}
