//! LLM- and search-backed research stages.
//!
//! [`LlmResearchStages`] implements both collaborator traits the
//! orchestrator needs, on top of any [`LlmBackend`] and [`SearchProvider`]
//! (normally the two failover clients).

mod credibility;

pub use credibility::{domain_credibility, domain_of, BASE_CREDIBILITY};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, ResearchError, StageResult};
use crate::llm::{FallbackLlmClient, GenerateRequest, LlmBackend};
use crate::prompts::{
    render, CITATION_PROMPT, FALLBACK_PROMPT, OUTPUT_PROMPT, QUERY_ANALYSIS_PROMPT,
    REASONING_PROMPT, RESEARCH_SYSTEM_PROMPT, VERIFICATION_PROMPT,
};
use crate::research::{
    retry_with_backoff, Audience, CitationBundle, CitationStyle, FallbackContent,
    FallbackContentGenerator, Findings, OutputFormat, QueryAnalysis, ReportBundle,
    ResearchStages, RetryPolicy, Source, SubQuery, SynthesisOutput, VerificationResult,
};
use crate::search::{FallbackSearchClient, SearchHit, SearchProvider};

/// Longest excerpt of a source's text included in a prompt, in characters.
const MAX_SOURCE_EXCERPT_CHARS: usize = 1500;

/// Research stages backed by an LLM and a search provider.
#[derive(Clone)]
pub struct LlmResearchStages {
    llm: Arc<dyn LlmBackend>,
    search: Arc<dyn SearchProvider>,
    search_retry: RetryPolicy,
}

impl LlmResearchStages {
    /// Create stages over an LLM and a search provider.
    pub fn new(llm: Arc<dyn LlmBackend>, search: Arc<dyn SearchProvider>) -> Self {
        Self {
            llm,
            search,
            search_retry: RetryPolicy::default(),
        }
    }

    /// Build both failover clients from configuration.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let llm = FallbackLlmClient::from_config(config)?;
        let search = FallbackSearchClient::from_config(&config.search)?;
        Ok(Self::new(Arc::new(llm), Arc::new(search))
            .with_search_retry(config.research.search_retry))
    }

    /// Retry policy applied around each search call.
    pub fn with_search_retry(mut self, policy: RetryPolicy) -> Self {
        self.search_retry = policy;
        self
    }

    /// Ask the LLM for JSON and decode it as `T`.
    async fn ask<T: DeserializeOwned>(&self, component: &str, prompt: String) -> StageResult<T> {
        let start = Instant::now();
        let request = GenerateRequest::new(prompt).with_system(RESEARCH_SYSTEM_PROMPT);
        let value = self.llm.generate_json(&request).await?;

        debug!(
            component = %component,
            backend = %self.llm.name(),
            latency_ms = start.elapsed().as_millis(),
            "Stage LLM call returned"
        );

        serde_json::from_value(value).map_err(|e| {
            ResearchError::collaborator(component, format!("unexpected response shape: {}", e))
        })
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= MAX_SOURCE_EXCERPT_CHARS {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(MAX_SOURCE_EXCERPT_CHARS).collect();
        cut.push_str("...");
        cut
    }
}

/// Numbered source list for prompts.
fn format_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let body = if s.content.is_empty() { &s.snippet } else { &s.content };
            format!(
                "[{}] {} ({})\nCredibility: {:.2}\n{}",
                i + 1,
                s.title,
                s.url,
                s.credibility_score,
                excerpt(body)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn source_from_hit(hit: SearchHit) -> Source {
    let domain = domain_of(&hit.url);
    let credibility = domain_credibility(&domain);
    let mut source = Source::new(hit.url, hit.title)
        .with_snippet(hit.snippet)
        .with_content(hit.content)
        .with_domain(domain)
        .with_credibility(credibility);
    source.metadata = json!({
        "provider": hit.provider,
        "relevance_score": hit.score,
    });
    source
}

#[async_trait]
impl ResearchStages for LlmResearchStages {
    async fn analyze(&self, query: &str) -> StageResult<QueryAnalysis> {
        if query.trim().is_empty() {
            return Err(ResearchError::InvalidInput {
                field: "query".to_string(),
                reason: "Query cannot be empty".to_string(),
            });
        }

        let prompt = render(QUERY_ANALYSIS_PROMPT, &[("query", query)]);
        let mut analysis: QueryAnalysis = self.ask("query_analysis", prompt).await?;

        analysis.raw_query = query.to_string();
        analysis.sub_queries.retain(|sq| !sq.query.trim().is_empty());
        if analysis.sub_queries.is_empty() {
            analysis.sub_queries.push(SubQuery::new(query));
        }

        info!(
            domain = %analysis.domain,
            sub_queries = analysis.sub_queries.len(),
            "Query analysis parsed"
        );
        Ok(analysis)
    }

    async fn search(&self, query: &str, max_results: usize) -> StageResult<Vec<Source>> {
        let hits = retry_with_backoff(&self.search_retry, "web_search", |_| {
            self.search.search(query, max_results)
        })
        .await?;

        Ok(hits.into_iter().map(source_from_hit).collect())
    }

    async fn reason(&self, query: &str, sources: &[Source]) -> StageResult<SynthesisOutput> {
        let sources_text = format_sources(sources);
        let prompt = render(REASONING_PROMPT, &[("query", query), ("sources", &sources_text)]);
        let mut synthesis: SynthesisOutput = self.ask("reasoning", prompt).await?;

        if synthesis.synthesis.trim().is_empty() {
            return Err(ResearchError::collaborator("reasoning", "empty synthesis"));
        }

        for (i, step) in synthesis.reasoning_steps.iter_mut().enumerate() {
            if step.step_number == 0 {
                step.step_number = i as u32 + 1;
            }
        }
        synthesis.confidence = synthesis.confidence.map(|c| c.clamp(0.0, 1.0));

        Ok(synthesis)
    }

    async fn verify(&self, claims: &[String], sources: &[Source]) -> StageResult<VerificationResult> {
        if claims.is_empty() {
            return Ok(VerificationResult {
                caveats: vec!["No claims were available to verify".to_string()],
                ..VerificationResult::default()
            });
        }

        let claims_text = claims
            .iter()
            .map(|c| format!("- {}", c))
            .collect::<Vec<_>>()
            .join("\n");
        let sources_text = format_sources(sources);
        let prompt = render(
            VERIFICATION_PROMPT,
            &[("claims", &claims_text), ("sources", &sources_text)],
        );

        let mut verification: VerificationResult = self.ask("verification", prompt).await?;
        if !verification.overall_confidence.is_finite() {
            verification.overall_confidence = VerificationResult::default().overall_confidence;
        }
        verification.overall_confidence = verification.overall_confidence.clamp(0.0, 1.0);

        Ok(verification)
    }

    async fn cite(
        &self,
        sources: &[Source],
        content: &str,
        style: CitationStyle,
    ) -> StageResult<CitationBundle> {
        let sources_text = sources
            .iter()
            .enumerate()
            .map(|(i, s)| format!("[{}] {} ({}) domain: {}", i + 1, s.title, s.url, s.domain))
            .collect::<Vec<_>>()
            .join("\n");
        let content = excerpt(content);
        let prompt = render(
            CITATION_PROMPT,
            &[
                ("style", style.as_str()),
                ("sources", &sources_text),
                ("content", &content),
            ],
        );

        let mut bundle: CitationBundle = self.ask("citation", prompt).await?;
        if bundle.style.is_empty() {
            bundle.style = style.as_str().to_string();
        }
        Ok(bundle)
    }

    async fn format_output(
        &self,
        query: &str,
        findings: &Findings,
        sources: &[Source],
        confidence: f64,
        audience: Audience,
        format: OutputFormat,
    ) -> StageResult<ReportBundle> {
        let findings_text = serde_json::to_string_pretty(findings)
            .map_err(|e| ResearchError::Internal {
                message: format!("Failed to serialize findings: {}", e),
            })?;
        let sources_text = format_sources(sources);
        let confidence_text = format!("{:.0}%", confidence * 100.0);
        let prompt = render(
            OUTPUT_PROMPT,
            &[
                ("query", query),
                ("audience", audience.as_str()),
                ("format", format.as_str()),
                ("confidence", &confidence_text),
                ("findings", &findings_text),
                ("sources", &sources_text),
            ],
        );

        let report: ReportBundle = self.ask("output_generation", prompt).await?;
        if report.summary.trim().is_empty() && report.report.trim().is_empty() {
            return Err(ResearchError::collaborator("output_generation", "empty report"));
        }
        Ok(report)
    }
}

#[async_trait]
impl FallbackContentGenerator for LlmResearchStages {
    async fn generate_fallback_content(
        &self,
        query: &str,
        available: Option<&SynthesisOutput>,
        failures: &[String],
    ) -> StageResult<FallbackContent> {
        let available_text = available
            .map(|s| s.synthesis.clone())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "None".to_string());
        let failures_text = if failures.is_empty() {
            "Unknown failure".to_string()
        } else {
            failures.join("\n")
        };
        let prompt = render(
            FALLBACK_PROMPT,
            &[
                ("query", query),
                ("available", &available_text),
                ("failures", &failures_text),
            ],
        );

        let mut content: FallbackContent = self.ask("fallback", prompt).await?;
        content.confidence = content.confidence.clamp(0.0, 1.0);
        content.completeness = content.completeness.clamp(0.0, 1.0);
        Ok(content)
    }
}
