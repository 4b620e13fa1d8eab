//! Research tools: Wikipedia, arXiv, web search and page fetching.
//!
//! All lookups go through [`ResearchClient`], which owns the HTTP client and the
//! precompiled patterns used to pick apart Atom feeds and HTML pages.

mod arxiv;
mod html;
mod web;
mod wikipedia;

pub use arxiv::Paper;
pub use html::html_to_text;
pub use web::SearchHit;

use crate::config::ToolSettings;
use crate::error::Result;
use std::time::Duration;

/// Timeout for research requests.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the research tools.
pub struct ResearchClient {
    http: reqwest::Client,
    settings: ToolSettings,
    feed: arxiv::FeedPatterns,
    results: web::ResultPatterns,
}

impl ResearchClient {
    /// Create a client from tool settings.
    pub fn new(settings: ToolSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(settings.user_agent.clone())
            .build()?;
        Ok(Self::with_http_client(http, settings))
    }

    /// Create a client around an existing HTTP client.
    pub fn with_http_client(http: reqwest::Client, settings: ToolSettings) -> Self {
        Self {
            http,
            settings,
            feed: arxiv::FeedPatterns::new(),
            results: web::ResultPatterns::new(),
        }
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }
}
