//! Degraded output after a stage failure.

use serde_json::json;
use tracing::{error, warn};

use super::collaborators::FallbackContentGenerator;
use super::session::ResearchSession;
use super::stage::ResearchStage;
use super::types::{ResearchResult, ResultSource, VerificationStatus};
use crate::error::ResearchError;

/// Confidence reported for a degraded result built from fallback content.
pub const DEGRADED_CONFIDENCE: f64 = 0.2;

/// Answer used when no fallback content could be produced.
pub const APOLOGY_MESSAGE: &str = "Research could not be completed.";

/// Build a partial result for a failed run. Never fails.
///
/// The answer comes from the fallback generator when it succeeds with
/// non-empty text (confidence [`DEGRADED_CONFIDENCE`]); otherwise it is
/// [`APOLOGY_MESSAGE`] with confidence 0.
pub async fn degraded_result(
    generator: &dyn FallbackContentGenerator,
    session: &ResearchSession,
    failed_stage: ResearchStage,
    failure: &ResearchError,
) -> ResearchResult {
    let mut fallback_error = None;

    let content = match generator
        .generate_fallback_content(
            session.query(),
            session.synthesis.as_ref(),
            &session.progress.errors,
        )
        .await
    {
        Ok(content) => Some(content),
        Err(e) => {
            error!(
                session_id = %session.session_id,
                error = %e,
                "Fallback content generation failed"
            );
            fallback_error = Some(e.to_string());
            None
        }
    };

    let (answer, confidence) = match &content {
        Some(c) if !c.response.trim().is_empty() => (c.response.clone(), DEGRADED_CONFIDENCE),
        Some(_) => {
            warn!(session_id = %session.session_id, "Fallback content was empty");
            (APOLOGY_MESSAGE.to_string(), DEGRADED_CONFIDENCE)
        }
        None => (APOLOGY_MESSAGE.to_string(), 0.0),
    };

    let stages_completed: Vec<&str> = session
        .progress
        .stages_completed
        .iter()
        .map(|s| s.as_str())
        .collect();

    ResearchResult {
        query: session.query().to_string(),
        answer,
        confidence,
        sources: session.sources.iter().map(ResultSource::from).collect(),
        reasoning_steps: session.reasoning_steps.clone(),
        verification_status: VerificationStatus::Failed,
        metadata: json!({
            "partial": true,
            "error": failure.to_string(),
            "error_type": failure.kind(),
            "failed_stage": failed_stage.as_str(),
            "session_id": session.session_id,
            "stages_completed": stages_completed,
            "stage_errors": session.progress.errors,
            "fallback": content,
            "fallback_error": fallback_error,
        }),
    }
}
