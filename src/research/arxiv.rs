//! arXiv paper search over the Atom export API.

use super::html::decode_entities;
use super::ResearchClient;
use crate::error::Result;
use regex::Regex;
use tracing::{debug, instrument};

/// A paper from an arXiv search.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    pub title: String,
    pub authors: Vec<String>,
    /// Publication date (YYYY-MM-DD).
    pub published: String,
    pub summary: String,
}

/// Patterns for the parts of an Atom feed we read.
pub(super) struct FeedPatterns {
    entry: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    author: Regex,
    whitespace: Regex,
}

impl FeedPatterns {
    pub(super) fn new() -> Self {
        Self {
            entry: Regex::new(r"(?s)<entry>(.*?)</entry>").expect("Invalid regex"),
            title: Regex::new(r"(?s)<title[^>]*>(.*?)</title>").expect("Invalid regex"),
            summary: Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>").expect("Invalid regex"),
            published: Regex::new(r"<published>([^<]*)</published>").expect("Invalid regex"),
            author: Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").expect("Invalid regex"),
            whitespace: Regex::new(r"\s+").expect("Invalid regex"),
        }
    }

    fn clean(&self, raw: &str) -> String {
        let decoded = decode_entities(raw);
        self.whitespace.replace_all(decoded.trim(), " ").to_string()
    }

    /// Extract papers from an Atom feed body.
    pub(super) fn parse(&self, xml: &str) -> Vec<Paper> {
        self.entry
            .captures_iter(xml)
            .map(|entry| {
                let body = &entry[1];
                let field = |re: &Regex| {
                    re.captures(body)
                        .map(|c| self.clean(&c[1]))
                        .unwrap_or_default()
                };

                Paper {
                    title: field(&self.title),
                    authors: self
                        .author
                        .captures_iter(body)
                        .map(|c| self.clean(&c[1]))
                        .collect(),
                    published: field(&self.published).chars().take(10).collect(),
                    summary: field(&self.summary),
                }
            })
            .collect()
    }
}

impl ResearchClient {
    /// Search arXiv and format the matching papers.
    #[instrument(skip(self))]
    pub async fn search_arxiv(&self, query: &str, max_results: usize) -> Result<String> {
        let url = format!(
            "{}/api/query",
            self.settings.arxiv_base_url.trim_end_matches('/')
        );
        let search_query = format!("all:{}", query);
        let max_results = max_results.to_string();

        let body = self
            .http
            .get(&url)
            .query(&[
                ("search_query", search_query.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let papers = self.feed.parse(&body);
        debug!("arXiv returned {} papers", papers.len());

        Ok(format_papers(query, &papers))
    }
}

fn format_papers(query: &str, papers: &[Paper]) -> String {
    if papers.is_empty() {
        return format!("No arXiv papers found for query: '{}'", query);
    }

    let mut lines = vec![
        format!("=== ARXIV SEARCH: {} ===", query),
        format!("Found {} paper(s)", papers.len()),
        String::new(),
    ];

    for (i, paper) in papers.iter().enumerate() {
        lines.push(format!(
            "PAPER {}:\nTitle: {}\nAuthors: {}\nPublished: {}\nAbstract: {}\n---",
            i + 1,
            paper.title,
            paper.authors.join(", "),
            paper.published,
            paper.summary
        ));
    }

    lines.push("=== END ARXIV RESULTS ===".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:attention</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models are based on
  complex recurrent &amp; convolutional networks.</summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let papers = FeedPatterns::new().parse(FEED);
        assert_eq!(papers.len(), 1);
        let paper = &papers[0];
        assert_eq!(paper.title, "Attention Is All You Need");
        assert_eq!(paper.authors, vec!["Ashish Vaswani", "Noam Shazeer"]);
        assert_eq!(paper.published, "2017-06-12");
        assert_eq!(
            paper.summary,
            "The dominant sequence transduction models are based on complex recurrent & convolutional networks."
        );
    }

    #[tokio::test]
    async fn test_search_arxiv() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/query"))
            .and(query_param("search_query", "all:attention"))
            .and(query_param("max_results", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let settings = ToolSettings {
            arxiv_base_url: server.uri(),
            ..ToolSettings::default()
        };
        let client = ResearchClient::with_http_client(reqwest::Client::new(), settings);

        let output = client.search_arxiv("attention", 2).await.unwrap();
        assert!(output.starts_with("=== ARXIV SEARCH: attention ==="));
        assert!(output.contains("Found 1 paper(s)"));
        assert!(output.contains("Authors: Ashish Vaswani, Noam Shazeer"));
        assert!(output.ends_with("=== END ARXIV RESULTS ==="));
    }

    #[test]
    fn test_no_papers() {
        assert_eq!(
            format_papers("zzz", &[]),
            "No arXiv papers found for query: 'zzz'"
        );
    }
}
