//! Web search providers and the failover search client.

mod fallback;
mod serper;
mod tavily;

pub use fallback::FallbackSearchClient;
pub use serper::SerperProvider;
pub use tavily::TavilyProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::SearchResult;

/// One result returned by a search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    /// Short excerpt shown by the provider.
    #[serde(default)]
    pub snippet: String,
    /// Longer page content, when the provider returns it.
    #[serde(default)]
    pub content: String,
    /// Provider relevance score, if any.
    #[serde(default)]
    pub score: Option<f64>,
    /// Provider that produced the hit.
    #[serde(default)]
    pub provider: String,
}

impl SearchHit {
    /// Create a hit with a URL and title
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: String::new(),
            content: String::new(),
            score: None,
            provider: String::new(),
        }
    }

    /// Set the snippet
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Set the content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// A web search backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Search the web, returning at most `max_results` hits.
    async fn search(&self, query: &str, max_results: usize) -> SearchResult<Vec<SearchHit>>;
}

/// Drop items whose URL was already seen, keeping first occurrences in order.
pub fn dedup_by_url<T, F>(items: Vec<T>, url_of: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let url = url_of(item);
            seen.insert(url.to_string())
        })
        .collect()
}
