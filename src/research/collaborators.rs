//! Seams between the orchestrator and the components that do the work.

use async_trait::async_trait;

use super::options::{Audience, CitationStyle, OutputFormat};
use super::types::{
    CitationBundle, FallbackContent, Findings, QueryAnalysis, ReportBundle, Source,
    SynthesisOutput, VerificationResult,
};
use crate::error::StageResult;

/// The six pipeline capabilities the orchestrator delegates to.
///
/// Any method may fail; the orchestrator handles every failure the same way.
#[async_trait]
pub trait ResearchStages: Send + Sync {
    /// Understand the query and decompose it into sub-queries.
    async fn analyze(&self, query: &str) -> StageResult<QueryAnalysis>;

    /// Search the web for one (sub-)query.
    async fn search(&self, query: &str, max_results: usize) -> StageResult<Vec<Source>>;

    /// Synthesize an answer from the sources.
    async fn reason(&self, query: &str, sources: &[Source]) -> StageResult<SynthesisOutput>;

    /// Check claims against the sources.
    async fn verify(&self, claims: &[String], sources: &[Source]) -> StageResult<VerificationResult>;

    /// Produce citations for the sources in the given style.
    async fn cite(
        &self,
        sources: &[Source],
        content: &str,
        style: CitationStyle,
    ) -> StageResult<CitationBundle>;

    /// Write the final report.
    async fn format_output(
        &self,
        query: &str,
        findings: &Findings,
        sources: &[Source],
        confidence: f64,
        audience: Audience,
        format: OutputFormat,
    ) -> StageResult<ReportBundle>;
}

/// Produces a best-effort answer after a stage failure.
#[async_trait]
pub trait FallbackContentGenerator: Send + Sync {
    /// Generate fallback content from whatever the run produced so far.
    ///
    /// `failures` lists the stage failure messages in order.
    async fn generate_fallback_content(
        &self,
        query: &str,
        available: Option<&SynthesisOutput>,
        failures: &[String],
    ) -> StageResult<FallbackContent>;
}
