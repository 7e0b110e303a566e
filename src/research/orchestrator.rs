//! The research pipeline driver.
//!
//! `research()` runs the six stages in order against one exclusively owned
//! [`ResearchSession`], publishes a status snapshot after every transition,
//! and switches to degraded output on the first stage failure. Concurrent
//! calls, including calls for the same query, share nothing but the session
//! registry, the error history and the collaborators.

use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::collaborators::{FallbackContentGenerator, ResearchStages};
use super::confidence::{aggregate, ConfidenceInputs, DEFAULT_TARGET_SOURCE_COUNT};
use super::degraded::degraded_result;
use super::errors::{ComponentType, ErrorContext, ErrorHandler, ErrorSeverity};
use super::options::{CitationStyle, ResearchOptions};
use super::retry::{retry_with_backoff, RetryPolicy};
use super::session::{ResearchSession, SessionIdGenerator, SessionRegistry, SessionStatus};
use super::stage::ResearchStage;
use super::types::{
    CitationBundle, Findings, QueryAnalysis, ReportBundle, ResearchResult, ResultSource, Source,
    SynthesisOutput, VerificationResult, VerificationStatus,
};
use crate::error::{ResearchError, StageResult};
use crate::search::dedup_by_url;
use crate::storage::{RunRecord, Storage};

/// Progress observer: called with the stage about to run (or `Complete`)
/// and the completion percentage at that moment.
pub type ProgressCallback<'a> = &'a (dyn Fn(ResearchStage, f64) + Send + Sync);

/// A stage failure together with the stage it happened in.
#[derive(Debug)]
struct StageFailure {
    stage: ResearchStage,
    error: ResearchError,
}

/// Drives research sessions through the pipeline.
pub struct ResearchOrchestrator {
    stages: Arc<dyn ResearchStages>,
    fallback_content: Arc<dyn FallbackContentGenerator>,
    storage: Option<Arc<dyn Storage>>,
    registry: SessionRegistry,
    ids: SessionIdGenerator,
    error_handler: Arc<ErrorHandler>,
    target_source_count: usize,
}

impl ResearchOrchestrator {
    /// Create an orchestrator over its collaborators.
    pub fn new(
        stages: Arc<dyn ResearchStages>,
        fallback_content: Arc<dyn FallbackContentGenerator>,
    ) -> Self {
        Self {
            stages,
            fallback_content,
            storage: None,
            registry: SessionRegistry::new(),
            ids: SessionIdGenerator::new(),
            error_handler: Arc::new(ErrorHandler::new()),
            target_source_count: DEFAULT_TARGET_SOURCE_COUNT,
        }
    }

    /// Persist every finished run to `storage`.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Share an error history with other components.
    pub fn with_error_handler(mut self, error_handler: Arc<ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }

    /// Source count at which the adequacy signal saturates.
    pub fn with_target_source_count(mut self, target: usize) -> Self {
        self.target_source_count = target.max(1);
        self
    }

    /// Error history shared by all sessions.
    pub fn error_handler(&self) -> &Arc<ErrorHandler> {
        &self.error_handler
    }

    /// Status of an in-flight session, `None` once it has finished.
    pub fn session_status(&self, session_id: &str) -> Option<SessionStatus> {
        self.registry.get(session_id)
    }

    /// Identifiers of in-flight sessions.
    pub fn active_session_ids(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Number of in-flight sessions.
    pub fn active_session_count(&self) -> usize {
        self.registry.len()
    }

    /// Research a query. Always returns a result; failures degrade it.
    pub async fn research(&self, query: &str, options: ResearchOptions) -> ResearchResult {
        self.research_with_progress(query, options, None).await
    }

    /// Research a query, reporting progress before each stage and on completion.
    pub async fn research_with_progress(
        &self,
        query: &str,
        options: ResearchOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> ResearchResult {
        let mut session = ResearchSession::new(self.ids.next_id(), query);
        let _guard = self.registry.register(&session);
        let start = Instant::now();

        info!(
            session_id = %session.session_id,
            query = %query,
            verify = options.verify_claims,
            max_sources = options.max_sources,
            "Research started"
        );

        let result = match self.run_pipeline(&mut session, &options, progress).await {
            Ok(result) => {
                info!(
                    session_id = %session.session_id,
                    confidence = result.confidence,
                    sources = result.sources.len(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "Research complete"
                );
                result
            }
            Err(failure) => self.handle_failure(&session, failure).await,
        };

        self.persist(&session, &result, start.elapsed().as_secs_f64())
            .await;

        result
    }

    async fn run_pipeline(
        &self,
        session: &mut ResearchSession,
        options: &ResearchOptions,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<ResearchResult, StageFailure> {
        let retry = options.stage_retry.as_ref();
        let query = session.query().to_string();

        // Stage 1: query analysis
        let analysis = self
            .run_stage(session, ResearchStage::QueryAnalysis, retry, progress, || {
                self.analyze_query(&query)
            })
            .await?;
        session.query_analysis = Some(analysis);

        // Stage 2: web search
        let analysis = session.query_analysis.clone();
        let sources = self
            .run_stage(session, ResearchStage::WebSearch, retry, progress, || {
                self.search_web(&query, analysis.as_ref(), options.max_sources)
            })
            .await?;
        session.sources = sources;

        // Stage 3: reasoning
        let sources = session.sources.clone();
        let synthesis = self
            .run_stage(session, ResearchStage::Reasoning, retry, progress, || {
                self.reason(&query, &sources)
            })
            .await?;
        session.reasoning_steps = synthesis.reasoning_steps.clone();
        session.synthesis = Some(synthesis);

        // Stage 4: verification (optional)
        if options.verify_claims {
            let synthesis = session.synthesis.clone();
            let verification = self
                .run_stage(session, ResearchStage::Verification, retry, progress, || {
                    self.verify(synthesis.as_ref(), &sources)
                })
                .await?;
            let updated = session.apply_source_assessments(&verification.source_assessments);
            if updated > 0 {
                info!(
                    session_id = %session.session_id,
                    updated,
                    "Applied source credibility assessments"
                );
            }
            session.verification = Some(verification);
        }

        // Stage 5: citation
        let sources = session.sources.clone();
        let content = session
            .synthesis
            .as_ref()
            .map(|s| s.synthesis.clone())
            .unwrap_or_default();
        let citations = self
            .run_stage(session, ResearchStage::Citation, retry, progress, || {
                self.cite(&sources, &content, options.citation_style)
            })
            .await?;
        session.citations = Some(citations);

        // Stage 6: output generation
        let confidence = self.calculate_confidence(session);
        let findings = Findings {
            synthesis: session.synthesis.clone(),
            verification: session.verification.clone(),
            reasoning_steps: session.reasoning_steps.clone(),
            information_gaps: session
                .synthesis
                .as_ref()
                .map(|s| s.gaps.clone())
                .unwrap_or_default(),
        };
        let report = self
            .run_stage(session, ResearchStage::OutputGeneration, retry, progress, || {
                self.generate_output(&query, &findings, &sources, confidence, options)
            })
            .await?;
        session.report = Some(report);

        let result = self.build_result(session, confidence, options);
        session.final_result = Some(result.clone());
        session.progress.mark_complete();
        self.registry.publish(session);
        if let Some(callback) = progress {
            callback(ResearchStage::Complete, session.progress.progress_percentage());
        }

        Ok(result)
    }

    /// Run one stage with uniform bookkeeping.
    ///
    /// Marks the stage current, notifies the observer, awaits the work
    /// (retrying per `retry` when given), records the duration, then marks
    /// it completed or records the failure. `work` must not borrow the
    /// session; its output is stored by the caller.
    async fn run_stage<T, F, Fut>(
        &self,
        session: &mut ResearchSession,
        stage: ResearchStage,
        retry: Option<&RetryPolicy>,
        progress: Option<ProgressCallback<'_>>,
        mut work: F,
    ) -> Result<T, StageFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StageResult<T>>,
    {
        session.progress.begin_stage(stage);
        self.registry.publish(session);
        if let Some(callback) = progress {
            callback(stage, session.progress.progress_percentage());
        }

        info!(session_id = %session.session_id, stage = %stage, "Stage started");
        let start = Instant::now();

        let outcome = match retry {
            Some(policy) => retry_with_backoff(policy, stage.as_str(), |_| work()).await,
            None => work().await,
        };

        let duration = start.elapsed().as_secs_f64();

        match outcome {
            Ok(value) => {
                session.progress.complete_stage(stage, duration);
                self.registry.publish(session);
                info!(
                    session_id = %session.session_id,
                    stage = %stage,
                    duration_ms = (duration * 1000.0) as u64,
                    "Stage completed"
                );
                Ok(value)
            }
            Err(e) => {
                session.progress.record_failure(stage, &e.to_string(), duration);
                self.registry.publish(session);
                error!(
                    session_id = %session.session_id,
                    stage = %stage,
                    error = %e,
                    "Stage failed"
                );
                Err(StageFailure { stage, error: e })
            }
        }
    }

    async fn analyze_query(&self, query: &str) -> StageResult<QueryAnalysis> {
        let analysis = self.stages.analyze(query).await?;
        info!(
            sub_queries = analysis.sub_queries.len(),
            complexity = ?analysis.complexity,
            "Query analyzed"
        );
        Ok(analysis)
    }

    /// Search each sub-query with a share of the budget, then the main query
    /// with the full budget; de-duplicate by URL and cap at `max_sources`.
    async fn search_web(
        &self,
        query: &str,
        analysis: Option<&QueryAnalysis>,
        max_sources: usize,
    ) -> StageResult<Vec<Source>> {
        let analysis = analysis.ok_or_else(|| ResearchError::missing("Query analysis"))?;
        let max_sources = max_sources.max(1);

        let mut all_sources = Vec::new();
        let sub_queries = &analysis.sub_queries;
        if !sub_queries.is_empty() {
            let per_sub_query = max_sources / sub_queries.len() + 1;
            for sub_query in sub_queries {
                let found = self.stages.search(&sub_query.query, per_sub_query).await?;
                all_sources.extend(found);
            }
        }

        let found = self.stages.search(query, max_sources).await?;
        all_sources.extend(found);

        let total = all_sources.len();
        let mut sources = dedup_by_url(all_sources, |s| s.url.as_str());
        sources.truncate(max_sources);

        info!(
            retrieved = total,
            kept = sources.len(),
            "Web search complete"
        );
        Ok(sources)
    }

    async fn reason(&self, query: &str, sources: &[Source]) -> StageResult<SynthesisOutput> {
        if sources.is_empty() {
            return Err(ResearchError::missing("Sources for reasoning"));
        }
        self.stages.reason(query, sources).await
    }

    async fn verify(
        &self,
        synthesis: Option<&SynthesisOutput>,
        sources: &[Source],
    ) -> StageResult<VerificationResult> {
        let synthesis = synthesis.ok_or_else(|| ResearchError::missing("Synthesis for verification"))?;
        self.stages.verify(&synthesis.key_findings, sources).await
    }

    async fn cite(
        &self,
        sources: &[Source],
        content: &str,
        style: CitationStyle,
    ) -> StageResult<CitationBundle> {
        if sources.is_empty() {
            return Err(ResearchError::missing("Sources for citation"));
        }
        self.stages.cite(sources, content, style).await
    }

    async fn generate_output(
        &self,
        query: &str,
        findings: &Findings,
        sources: &[Source],
        confidence: f64,
        options: &ResearchOptions,
    ) -> StageResult<ReportBundle> {
        self.stages
            .format_output(
                query,
                findings,
                sources,
                confidence,
                options.audience,
                options.output_format,
            )
            .await
    }

    fn calculate_confidence(&self, session: &ResearchSession) -> f64 {
        let inputs = ConfidenceInputs::from_sources(
            &session.sources,
            session.verification.as_ref().map(|v| v.overall_confidence),
            self.target_source_count,
            session.progress.errors.len(),
        );
        aggregate(&inputs)
    }

    fn build_result(
        &self,
        session: &ResearchSession,
        confidence: f64,
        options: &ResearchOptions,
    ) -> ResearchResult {
        let report = session.report.clone().unwrap_or_default();
        let answer = [
            report.summary.trim(),
            report.report.trim(),
            session.synthesis.as_ref().map(|s| s.synthesis.trim()).unwrap_or(""),
        ]
        .into_iter()
        .find(|text| !text.is_empty())
        .unwrap_or(super::degraded::APOLOGY_MESSAGE)
        .to_string();

        let verification_status = if session.verification.is_some() {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        };

        ResearchResult {
            query: session.query().to_string(),
            answer,
            confidence,
            sources: session.sources.iter().map(ResultSource::from).collect(),
            reasoning_steps: session.reasoning_steps.clone(),
            verification_status,
            metadata: json!({
                "partial": false,
                "session_id": session.session_id,
                "report": report.report,
                "followup_questions": report.followup_questions,
                "citations": session.citations,
                "audience": options.audience.as_str(),
                "output_format": options.output_format.as_str(),
                "citation_style": options.citation_style.as_str(),
                "trust_level": session.verification.as_ref().map(|v| v.trust_level.clone()),
                "information_gaps": session.synthesis.as_ref().map(|s| s.gaps.clone()).unwrap_or_default(),
                "stage_durations": session.progress.stage_times,
            }),
        }
    }

    async fn handle_failure(&self, session: &ResearchSession, failure: StageFailure) -> ResearchResult {
        let stages_completed: Vec<&str> = session
            .progress
            .stages_completed
            .iter()
            .map(|s| s.as_str())
            .collect();

        let context = ErrorContext::new(ComponentType::from(failure.stage), failure.stage.as_str())
            .with_query(session.query())
            .with_partial_results(json!({
                "session_id": session.session_id,
                "stages_completed": stages_completed,
                "sources": session.sources.len(),
            }));
        self.error_handler
            .record_error(&failure.error, context, ErrorSeverity::Error);

        warn!(
            session_id = %session.session_id,
            stage = %failure.stage,
            "Research failed, producing degraded output"
        );

        degraded_result(
            self.fallback_content.as_ref(),
            session,
            failure.stage,
            &failure.error,
        )
        .await
    }

    async fn persist(&self, session: &ResearchSession, result: &ResearchResult, duration_secs: f64) {
        let Some(storage) = &self.storage else {
            return;
        };

        let record = RunRecord::new(
            &session.session_id,
            result,
            &session.progress.stages_completed,
            duration_secs,
        );
        if let Err(e) = storage.save_run(&record).await {
            warn!(
                session_id = %session.session_id,
                error = %e,
                "Failed to persist research run"
            );
        }
    }
}
