//! Web search through DuckDuckGo's HTML endpoint, and page fetching.

use super::html::{decode_entities, html_to_text};
use super::ResearchClient;
use crate::content::truncate_chars;
use crate::error::{Result, SvarError};
use regex::Regex;
use tracing::{debug, instrument};
use url::Url;

/// A single web search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Patterns for DuckDuckGo result markup.
pub(super) struct ResultPatterns {
    link: Regex,
    href: Regex,
    snippet: Regex,
    tag: Regex,
}

impl ResultPatterns {
    pub(super) fn new() -> Self {
        Self {
            link: Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#)
                .expect("Invalid regex"),
            href: Regex::new(r#"href="([^"]*)""#).expect("Invalid regex"),
            snippet: Regex::new(r#"(?s)<(?:a|div|td)[^>]*class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
                .expect("Invalid regex"),
            tag: Regex::new(r"<[^>]+>").expect("Invalid regex"),
        }
    }

    fn strip(&self, fragment: &str) -> String {
        let text = self.tag.replace_all(fragment, "");
        decode_entities(text.trim())
    }

    /// Extract search hits from a result page.
    ///
    /// Each snippet is taken from the markup between its result link and the next one.
    pub(super) fn parse(&self, html: &str, max_results: usize) -> Vec<SearchHit> {
        let links: Vec<_> = self.link.captures_iter(html).collect();
        let mut hits = Vec::new();

        for (i, link) in links.iter().enumerate() {
            if hits.len() >= max_results {
                break;
            }

            let Some(href) = self.href.captures(&link[1]) else {
                continue;
            };
            let url = resolve_result_link(&decode_entities(&href[1]));
            if url.is_empty() {
                continue;
            }

            let block_start = link.get(0).map_or(0, |m| m.end());
            let block_end = links
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(html.len(), |m| m.start());
            let snippet = self
                .snippet
                .captures(&html[block_start..block_end])
                .map(|c| self.strip(&c[1]))
                .unwrap_or_default();

            hits.push(SearchHit {
                title: self.strip(&link[2]),
                url,
                snippet,
            });
        }

        hits
    }
}

/// Unwrap DuckDuckGo redirect links (`//duckduckgo.com/l/?uddg=<target>`).
fn resolve_result_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.path().starts_with("/l/") => url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        Ok(_) => absolute,
        Err(_) => String::new(),
    }
}

impl ResearchClient {
    /// Run a web search and format the hits.
    #[instrument(skip(self))]
    pub async fn web_search(&self, query: &str, max_results: usize) -> Result<String> {
        let url = format!(
            "{}/html/",
            self.settings.search_base_url.trim_end_matches('/')
        );

        let body = self
            .http
            .get(&url)
            .query(&[("q", query)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let hits = self.results.parse(&body, max_results);
        debug!("Web search returned {} hits", hits.len());

        if hits.is_empty() {
            return Ok(format!("No web results found for query: '{}'", query));
        }

        let formatted = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| format!("{}. {}\n   {}\n   {}", i + 1, hit.title, hit.url, hit.snippet))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(format!(
            "=== WEB SEARCH: {} ===\n\n{}\n\n=== END WEB RESULTS ===",
            query, formatted
        ))
    }

    /// Fetch a URL and return its readable text, truncated to `chars_max`.
    #[instrument(skip(self))]
    pub async fn fetch_url_text(&self, url: &str, chars_max: usize) -> Result<String> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SvarError::Research(format!(
                "Only http(s) URLs can be fetched, got {}",
                parsed.scheme()
            )));
        }

        let response = self.http.get(parsed).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let bytes = response.bytes().await?;

        let is_textual = content_type.is_empty()
            || content_type.starts_with("text/")
            || content_type.contains("json")
            || content_type.contains("xml");
        if !is_textual {
            return Ok(format!(
                "Fetched {} ({}, {} bytes). Binary content cannot be shown.",
                url,
                content_type,
                bytes.len()
            ));
        }

        let raw = String::from_utf8_lossy(&bytes);
        let text = if content_type.contains("html") || raw.trim_start().starts_with('<') {
            html_to_text(&raw)
        } else {
            raw.into_owned()
        };

        let (body, truncated) = truncate_chars(&text, chars_max);
        let mut out = format!("=== URL CONTENT: {} ===\n\n{}", url, body);
        if truncated {
            out.push_str("\n\n[content truncated]");
        }
        if is_video_page(url) {
            out.push_str(
                "\n\nNote: this is a video page. Only its text (title, description) is available, not the video itself.",
            );
        }
        out.push_str("\n\n=== END URL CONTENT ===");
        Ok(out)
    }
}

fn is_video_page(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .is_some_and(|h| h.ends_with("youtube.com") || h == "youtu.be" || h.ends_with("vimeo.com"))
}
