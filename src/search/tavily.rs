use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{SearchHit, SearchProvider};
use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};

const PROVIDER: &str = "tavily";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    raw_content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

impl From<TavilyResult> for SearchHit {
    fn from(r: TavilyResult) -> Self {
        SearchHit {
            url: r.url,
            title: r.title,
            content: r.raw_content.unwrap_or_else(|| r.content.clone()),
            snippet: r.content,
            score: r.score,
            provider: PROVIDER.to_string(),
        }
    }
}

/// Tavily search API (primary provider).
#[derive(Clone)]
pub struct TavilyProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl TavilyProvider {
    /// Create a provider from search configuration
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(SearchError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str, max_results: usize) -> SearchResult<Vec<SearchHit>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| SearchError::NotConfigured {
            provider: PROVIDER.to_string(),
        })?;

        let body = TavilyRequest {
            api_key,
            query,
            max_results,
            search_depth: "advanced",
            include_raw_content: false,
        };

        debug!(provider = PROVIDER, query = %query, max_results, "Searching");
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    SearchError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let parsed: TavilyResponse = response.json().await.map_err(|e| SearchError::InvalidResponse {
            message: format!("Failed to parse response: {}", e),
        })?;

        let hits: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .take(max_results)
            .map(SearchHit::from)
            .collect();

        info!(
            provider = PROVIDER,
            results = hits.len(),
            latency_ms = start.elapsed().as_millis(),
            "Search completed"
        );

        Ok(hits)
    }
}
