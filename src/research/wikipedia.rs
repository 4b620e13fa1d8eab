//! Wikipedia lookups over the MediaWiki action API.

use super::ResearchClient;
use crate::content::truncate_chars;
use crate::error::{Result, SvarError};
use serde_json::Value;
use tracing::{debug, instrument, warn};

impl ResearchClient {
    /// Search Wikipedia and return plain-text extracts of the top pages.
    #[instrument(skip(self))]
    pub async fn search_wikipedia(
        &self,
        query: &str,
        top_k: usize,
        chars_max: usize,
    ) -> Result<String> {
        let titles = self.wikipedia_titles(query, top_k).await?;
        debug!("Wikipedia search matched {} pages", titles.len());

        if titles.is_empty() {
            return Ok(format!("No Wikipedia results found for query: '{}'", query));
        }

        let mut sections = Vec::new();
        for title in &titles {
            match self.wikipedia_extract(title).await {
                Ok(Some(extract)) => {
                    let (summary, truncated) = truncate_chars(&extract, chars_max);
                    let ellipsis = if truncated { "..." } else { "" };
                    sections.push(format!("Page: {}\nSummary: {}{}", title, summary, ellipsis));
                }
                Ok(None) => debug!("No extract for {}", title),
                Err(e) => warn!("Failed to load Wikipedia page {}: {}", title, e),
            }
        }

        if sections.is_empty() {
            return Ok(format!("No Wikipedia results found for query: '{}'", query));
        }

        Ok(format!(
            "=== WIKIPEDIA SEARCH: {} ===\n\n{}\n\n=== END WIKIPEDIA RESULTS ===",
            query,
            sections.join("\n\n")
        ))
    }

    fn wikipedia_api(&self) -> String {
        format!(
            "{}/w/api.php",
            self.settings.wikipedia_base_url.trim_end_matches('/')
        )
    }

    async fn wikipedia_titles(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let limit = limit.to_string();
        let body: Value = self
            .http
            .get(self.wikipedia_api())
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("format", "json"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let results = body["query"]["search"]
            .as_array()
            .ok_or_else(|| SvarError::Research("Unexpected Wikipedia search response".to_string()))?;

        Ok(results
            .iter()
            .filter_map(|r| r["title"].as_str().map(String::from))
            .collect())
    }

    async fn wikipedia_extract(&self, title: &str) -> Result<Option<String>> {
        let body: Value = self
            .http
            .get(self.wikipedia_api())
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("format", "json"),
                ("titles", title),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let extract = body["query"]["pages"]
            .as_object()
            .and_then(|pages| pages.values().find_map(|p| p["extract"].as_str()))
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from);

        Ok(extract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolSettings;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_wikipedia() -> MockServer {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "Mercedes Sosa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"search": [
                    {"title": "Mercedes Sosa"},
                    {"title": "Cantora, un Viaje Íntimo"}
                ]}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .and(query_param("titles", "Mercedes Sosa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": {"123": {
                    "title": "Mercedes Sosa",
                    "extract": "Haydée Mercedes Sosa was an Argentine singer."
                }}}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .and(query_param("titles", "Cantora, un Viaje Íntimo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": {"-1": {"title": "Cantora, un Viaje Íntimo", "missing": ""}}}
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "qwxzv"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"search": []}
            })))
            .mount(&server)
            .await;

        server
    }

    fn client(server: &MockServer) -> ResearchClient {
        let settings = ToolSettings {
            wikipedia_base_url: server.uri(),
            ..ToolSettings::default()
        };
        ResearchClient::with_http_client(reqwest::Client::new(), settings)
    }

    #[tokio::test]
    async fn test_search_wikipedia() {
        let server = mock_wikipedia().await;
        let output = client(&server)
            .search_wikipedia("Mercedes Sosa", 2, 2000)
            .await
            .unwrap();

        assert_eq!(
            output,
            "=== WIKIPEDIA SEARCH: Mercedes Sosa ===\n\n\
             Page: Mercedes Sosa\nSummary: Haydée Mercedes Sosa was an Argentine singer.\n\n\
             === END WIKIPEDIA RESULTS ==="
        );
    }

    #[tokio::test]
    async fn test_search_wikipedia_truncates() {
        let server = mock_wikipedia().await;
        let output = client(&server)
            .search_wikipedia("Mercedes Sosa", 2, 12)
            .await
            .unwrap();
        assert!(output.contains("Summary: Haydée Merce..."));
    }

    #[tokio::test]
    async fn test_search_wikipedia_no_results() {
        let server = mock_wikipedia().await;
        let output = client(&server)
            .search_wikipedia("qwxzv", 3, 2000)
            .await
            .unwrap();
        assert_eq!(output, "No Wikipedia results found for query: 'qwxzv'");
    }
}
