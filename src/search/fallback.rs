//! Search failover between a primary and a fallback provider.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use super::{SearchHit, SearchProvider, SerperProvider, TavilyProvider};
use crate::config::SearchConfig;
use crate::error::SearchResult;

/// Routes searches to a primary provider, switching to the fallback for good
/// once the primary errors or returns nothing.
pub struct FallbackSearchClient {
    primary: Arc<dyn SearchProvider>,
    fallback: Arc<dyn SearchProvider>,
    use_fallback: AtomicBool,
}

impl FallbackSearchClient {
    /// Create a client over two providers
    pub fn new(primary: Arc<dyn SearchProvider>, fallback: Arc<dyn SearchProvider>) -> Self {
        Self {
            primary,
            fallback,
            use_fallback: AtomicBool::new(false),
        }
    }

    /// Build Tavily (primary) and Serper (fallback) from config.
    pub fn from_config(config: &SearchConfig) -> SearchResult<Self> {
        let primary = TavilyProvider::new(config)?;
        let fallback = SerperProvider::new(config)?;
        let start_on_fallback = !primary.is_configured() && fallback.is_configured();

        let client = Self::new(Arc::new(primary), Arc::new(fallback));
        if start_on_fallback {
            info!("Primary search provider not configured, starting on fallback");
            client.use_fallback.store(true, Ordering::SeqCst);
        }
        Ok(client)
    }

    /// Whether the fallback provider is now in use
    pub fn is_using_fallback(&self) -> bool {
        self.use_fallback.load(Ordering::SeqCst)
    }

    /// Name of the provider that will serve the next search
    pub fn active_provider(&self) -> &str {
        if self.is_using_fallback() {
            self.fallback.name()
        } else {
            self.primary.name()
        }
    }
}

#[async_trait]
impl SearchProvider for FallbackSearchClient {
    fn name(&self) -> &str {
        self.active_provider()
    }

    async fn search(&self, query: &str, max_results: usize) -> SearchResult<Vec<SearchHit>> {
        if !self.is_using_fallback() {
            match self.primary.search(query, max_results).await {
                Ok(hits) if !hits.is_empty() => return Ok(hits),
                Ok(_) => {
                    warn!(
                        primary = %self.primary.name(),
                        query = %query,
                        "Primary search returned no results, switching to fallback"
                    );
                }
                Err(e) => {
                    warn!(
                        primary = %self.primary.name(),
                        error = %e,
                        "Primary search failed, switching to fallback"
                    );
                }
            }
            self.use_fallback.store(true, Ordering::SeqCst);
        }

        self.fallback.search(query, max_results).await
    }
}
