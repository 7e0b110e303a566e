use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{SearchHit, SearchProvider};
use crate::config::SearchConfig;
use crate::error::{SearchError, SearchResult};

const PROVIDER: &str = "serper";

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    position: Option<u32>,
}

impl From<SerperOrganic> for SearchHit {
    fn from(r: SerperOrganic) -> Self {
        // Rank 1 scores 1.0, decaying with position.
        let score = r.position.map(|p| 1.0 / p.max(1) as f64);
        SearchHit {
            url: r.link,
            title: r.title,
            content: r.snippet.clone(),
            snippet: r.snippet,
            score,
            provider: PROVIDER.to_string(),
        }
    }
}

/// Serper (Google) search API, used as the fallback provider.
#[derive(Clone)]
pub struct SerperProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl SerperProvider {
    /// Create a provider from search configuration
    pub fn new(config: &SearchConfig) -> SearchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(SearchError::Http)?;

        Ok(Self {
            client,
            base_url: config.fallback_base_url.trim_end_matches('/').to_string(),
            api_key: config.fallback_api_key.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl SearchProvider for SerperProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search(&self, query: &str, max_results: usize) -> SearchResult<Vec<SearchHit>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| SearchError::NotConfigured {
            provider: PROVIDER.to_string(),
        })?;

        debug!(provider = PROVIDER, query = %query, max_results, "Searching");
        let start = Instant::now();

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&SerperRequest {
                q: query,
                num: max_results,
            })
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

        let parsed: SerperResponse = response.json().await.map_err(|e| SearchError::InvalidResponse {
            message: format!("Failed to parse response: {}", e),
        })?;

        let hits: Vec<SearchHit> = parsed
            .organic
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
