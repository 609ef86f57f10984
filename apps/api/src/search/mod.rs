//! Candidate search — the web-search capability behind the `CandidateSearch` trait.
//!
//! The production backend is Tavily. The trait exists so the pipeline and its
//! tests never depend on the provider directly.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
const SEARCH_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider rejected the query for being over its length limit.
    /// Recognized from the error message body; callers degrade the query once.
    #[error("Query rejected as too long: {0}")]
    QueryTooLong(String),

    #[error("Provider error (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed provider response: {0}")]
    Parse(String),
}

/// One raw search result as returned by the provider, pre-filtering.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: Option<String>,
    pub url: String,
    pub content: Option<String>,
    pub image: Option<String>,
}

/// The search capability injected into the pipeline.
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    /// Runs a provider search and returns results in provider order.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Tavily backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: Option<String>,
    url: Option<String>,
    /// Tavily's extracted snippet. `raw_content` is the full page text when
    /// `include_raw_content` is set; prefer it when present.
    content: Option<String>,
    raw_content: Option<String>,
}

pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(SEARCH_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl CandidateSearch for TavilyClient {
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        let body = serde_json::json!({
            "query": query,
            "max_results": max_results,
            "search_depth": "advanced",
            "include_answer": false,
            "include_raw_content": true,
            "include_images": true,
        });

        let response = self
            .client
            .post(TAVILY_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 400 && message.to_lowercase().contains("too long") {
                return Err(SearchError::QueryTooLong(message));
            }
            return Err(SearchError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let payload: TavilyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;

        debug!(
            "Search returned {} results for query of {} chars",
            payload.results.len(),
            query.len()
        );

        // Images come back as a flat list; pair them with results by index.
        let mut images = payload.images.into_iter();
        let hits = payload
            .results
            .into_iter()
            .filter_map(|r| {
                let url = r.url.filter(|u| !u.trim().is_empty())?;
                Some(SearchHit {
                    title: r.title,
                    url,
                    content: r.raw_content.or(r.content),
                    image: images.next(),
                })
            })
            .collect();

        Ok(hits)
    }
}
