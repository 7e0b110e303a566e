//! Integration tests for the search providers
//!
//! Tests Tavily and Serper request/response handling with wiremock, and the
//! failover client's switching rules.

use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use deep_research::config::SearchConfig;
use deep_research::error::SearchError;
use deep_research::search::{
    dedup_by_url, FallbackSearchClient, SearchHit, SearchProvider, SerperProvider, TavilyProvider,
};

fn test_search_config(tavily_url: &str, serper_url: &str) -> SearchConfig {
    SearchConfig {
        api_key: Some("tvly-test".to_string()),
        base_url: tavily_url.to_string(),
        fallback_api_key: Some("serper-test".to_string()),
        fallback_base_url: serper_url.to_string(),
        max_results: 5,
        timeout_ms: 5000,
    }
}

fn tavily_results(urls: &[&str]) -> serde_json::Value {
    let results: Vec<_> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| {
            json!({
                "url": url,
                "title": format!("Result {}", i + 1),
                "content": format!("Snippet {}", i + 1),
                "score": 0.9 - i as f64 * 0.1
            })
        })
        .collect();
    json!({ "query": "q", "results": results })
}

#[cfg(test)]
mod tavily_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(json!({
                "api_key": "tvly-test",
                "query": "rust async",
                "max_results": 3,
                "search_depth": "advanced"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(tavily_results(&[
                "https://tokio.rs/",
                "https://rust-lang.org/",
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = TavilyProvider::new(&test_search_config(&mock_server.uri(), "http://unused")).unwrap();
        let hits = provider.search("rust async", 3).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://tokio.rs/");
        assert_eq!(hits[0].title, "Result 1");
        assert_eq!(hits[0].snippet, "Snippet 1");
        assert_eq!(hits[0].content, "Snippet 1");
        assert_eq!(hits[0].score, Some(0.9));
        assert_eq!(hits[0].provider, "tavily");
    }

    #[tokio::test]
    async fn test_raw_content_preferred_for_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "url": "https://a.org",
                    "title": "A",
                    "content": "short",
                    "raw_content": "the full page text"
                }]
            })))
            .mount(&mock_server)
            .await;

        let provider = TavilyProvider::new(&test_search_config(&mock_server.uri(), "http://unused")).unwrap();
        let hits = provider.search("q", 5).await.unwrap();

        assert_eq!(hits[0].snippet, "short");
        assert_eq!(hits[0].content, "the full page text");
        assert_eq!(hits[0].score, None);
    }

    #[tokio::test]
    async fn test_results_capped_at_max() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tavily_results(&[
                "https://a.org",
                "https://b.org",
                "https://c.org",
            ])))
            .mount(&mock_server)
            .await;

        let provider = TavilyProvider::new(&test_search_config(&mock_server.uri(), "http://unused")).unwrap();
        let hits = provider.search("q", 2).await.unwrap();

        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = TavilyProvider::new(&test_search_config(&mock_server.uri(), "http://unused")).unwrap();
        let err = provider.search("q", 5).await.unwrap_err();

        match err {
            SearchError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let provider = TavilyProvider::new(&test_search_config(&mock_server.uri(), "http://unused")).unwrap();
        let err = provider.search("q", 5).await.unwrap_err();

        assert!(matches!(err, SearchError::InvalidResponse { .. }));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let mut config = test_search_config("http://unused", "http://unused");
        config.api_key = None;
        let provider = TavilyProvider::new(&config).unwrap();

        assert!(!provider.is_configured());
        let err = provider.search("q", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured { .. }));
    }
}

#[cfg(test)]
mod serper_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_search() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .and(header("X-API-KEY", "serper-test"))
            .and(body_partial_json(json!({"q": "rust async", "num": 4})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic": [
                    {"link": "https://tokio.rs/", "title": "Tokio", "snippet": "Async runtime", "position": 1},
                    {"link": "https://docs.rs/", "title": "Docs", "snippet": "Crate docs", "position": 4}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = SerperProvider::new(&test_search_config("http://unused", &mock_server.uri())).unwrap();
        let hits = provider.search("rust async", 4).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://tokio.rs/");
        assert_eq!(hits[0].content, "Async runtime");
        assert_eq!(hits[0].score, Some(1.0));
        assert_eq!(hits[1].score, Some(0.25));
        assert_eq!(hits[1].provider, "serper");
    }

    #[tokio::test]
    async fn test_no_organic_results() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"searchParameters": {}})))
            .mount(&mock_server)
            .await;

        let provider = SerperProvider::new(&test_search_config("http://unused", &mock_server.uri())).unwrap();
        let hits = provider.search("q", 4).await.unwrap();

        assert!(hits.is_empty());
    }
}

#[cfg(test)]
mod failover_tests {
    use super::*;

    async fn serper_with(urls: &[&str]) -> MockServer {
        let server = MockServer::start().await;
        let organic: Vec<_> = urls
            .iter()
            .enumerate()
            .map(|(i, u)| json!({"link": u, "title": "t", "snippet": "s", "position": i + 1}))
            .collect();
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organic": organic})))
            .mount(&server)
            .await;
        server
    }

    fn client(config: &SearchConfig) -> FallbackSearchClient {
        FallbackSearchClient::new(
            Arc::new(TavilyProvider::new(config).unwrap()),
            Arc::new(SerperProvider::new(config).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_primary_error_switches_to_fallback() {
        let tavily = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&tavily)
            .await;
        let serper = serper_with(&["https://fallback.org"]).await;

        let client = client(&test_search_config(&tavily.uri(), &serper.uri()));

        let hits = client.search("q", 5).await.unwrap();
        assert_eq!(hits[0].provider, "serper");
        assert!(client.is_using_fallback());

        // Sticky: Tavily's `expect(1)` fails the test if it is called again.
        let hits = client.search("q2", 5).await.unwrap();
        assert_eq!(hits[0].url, "https://fallback.org");
        assert_eq!(client.active_provider(), "serper");
    }

    #[tokio::test]
    async fn test_empty_primary_result_switches_to_fallback() {
        let tavily = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .mount(&tavily)
            .await;
        let serper = serper_with(&["https://fallback.org"]).await;

        let client = client(&test_search_config(&tavily.uri(), &serper.uri()));
        let hits = client.search("obscure", 5).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert!(client.is_using_fallback());
    }

    #[tokio::test]
    async fn test_primary_success_stays_on_primary() {
        let tavily = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tavily_results(&["https://a.org"])))
            .mount(&tavily)
            .await;
        let serper = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&serper)
            .await;

        let client = client(&test_search_config(&tavily.uri(), &serper.uri()));
        client.search("q", 5).await.unwrap();
        client.search("q", 5).await.unwrap();

        assert!(!client.is_using_fallback());
        assert_eq!(client.name(), "tavily");
    }

    #[tokio::test]
    async fn test_fallback_error_propagates() {
        let tavily = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&tavily)
            .await;
        let serper = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota"))
            .mount(&serper)
            .await;

        let client = client(&test_search_config(&tavily.uri(), &serper.uri()));
        let err = client.search("q", 5).await.unwrap_err();

        assert!(matches!(err, SearchError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_from_config_starts_on_fallback_without_primary_key() {
        let mut config = test_search_config("http://unused", "http://unused");
        config.api_key = None;

        let client = FallbackSearchClient::from_config(&config).unwrap();
        assert!(client.is_using_fallback());
        assert_eq!(client.active_provider(), "serper");
    }
}

#[test]
fn test_merged_provider_hits_dedup_first_wins() {
    let hits = vec![
        SearchHit::new("https://a.org", "A from tavily"),
        SearchHit::new("https://b.org", "B"),
        SearchHit::new("https://a.org", "A from serper"),
    ];

    let deduped = dedup_by_url(hits, |h| h.url.as_str());
    let titles: Vec<&str> = deduped.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["A from tavily", "B"]);
}
