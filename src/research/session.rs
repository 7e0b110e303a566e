//! Research sessions and the active-session registry.
//!
//! A [`ResearchSession`] is owned by the task running its `research()` call
//! and is never shared. Observers see it only through [`SessionStatus`]
//! snapshots the owner publishes into the [`SessionRegistry`] on every
//! transition.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::progress::ResearchProgress;
use super::stage::ResearchStage;
use super::types::{
    CitationBundle, QueryAnalysis, ReasoningStep, ReportBundle, ResearchResult, Source,
    SourceAssessment, SynthesisOutput, VerificationResult,
};

/// Mutable state of one research run.
#[derive(Debug, Clone)]
pub struct ResearchSession {
    /// Unique, monotonically assigned identifier.
    pub session_id: String,
    query: String,
    /// Stage bookkeeping.
    pub progress: ResearchProgress,
    /// Query analysis output.
    pub query_analysis: Option<QueryAnalysis>,
    /// De-duplicated sources, in retrieval order.
    pub sources: Vec<Source>,
    /// Reasoning output.
    pub synthesis: Option<SynthesisOutput>,
    /// Reasoning chain.
    pub reasoning_steps: Vec<ReasoningStep>,
    /// Verification output.
    pub verification: Option<VerificationResult>,
    /// Citation output.
    pub citations: Option<CitationBundle>,
    /// Report output.
    pub report: Option<ReportBundle>,
    /// Final result once the run is complete.
    pub final_result: Option<ResearchResult>,
}

impl ResearchSession {
    /// Create a session positioned at the first stage.
    pub fn new(session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            query: query.into(),
            progress: ResearchProgress::new(),
            query_analysis: None,
            sources: Vec::new(),
            synthesis: None,
            reasoning_steps: Vec::new(),
            verification: None,
            citations: None,
            report: None,
            final_result: None,
        }
    }

    /// The query this session researches. Immutable after creation.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Apply revised credibility scores to matching sources.
    ///
    /// Returns how many sources were updated. Assessments for unknown URLs
    /// are ignored; sources are never removed.
    pub fn apply_source_assessments(&mut self, assessments: &[SourceAssessment]) -> usize {
        let mut updated = 0;
        for assessment in assessments {
            if let Some(source) = self.sources.iter_mut().find(|s| s.url == assessment.url) {
                source.set_credibility(assessment.credibility_score);
                updated += 1;
            }
        }
        updated
    }

    /// Snapshot for status queries.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.session_id.clone(),
            query: self.query.clone(),
            current_stage: self.progress.current_stage,
            progress: self.progress.progress_percentage(),
            stages_completed: self.progress.stages_completed.clone(),
            errors: self.progress.errors.clone(),
            has_result: self.final_result.is_some(),
        }
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Session identifier.
    pub session_id: String,
    /// Query being researched.
    pub query: String,
    /// Stage in flight (or `complete`).
    pub current_stage: ResearchStage,
    /// Completion percentage in `[0, 100]`.
    pub progress: f64,
    /// Completed stages in order.
    pub stages_completed: Vec<ResearchStage>,
    /// Stage failure messages.
    pub errors: Vec<String>,
    /// Whether a final result exists.
    pub has_result: bool,
}

/// Assigns unique, monotonically increasing session identifiers.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl SessionIdGenerator {
    /// Create a generator starting at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier, e.g. `session_3_20240101120000`.
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("session_{}_{}", n, Utc::now().format("%Y%m%d%H%M%S"))
    }
}

/// Registry of active sessions keyed by session id.
///
/// Entries are independent: inserting, updating or removing one session never
/// touches another. Cloning the registry shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, SessionStatus>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SessionStatus>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SessionStatus>> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a session. The returned guard removes it when dropped.
    pub fn register(&self, session: &ResearchSession) -> SessionGuard {
        self.write()
            .insert(session.session_id.clone(), session.status());
        debug!(session_id = %session.session_id, "Session registered");
        SessionGuard {
            registry: self.clone(),
            session_id: session.session_id.clone(),
        }
    }

    /// Publish the latest snapshot of a registered session.
    ///
    /// A session that is no longer registered is not re-inserted.
    pub fn publish(&self, session: &ResearchSession) {
        if let Some(entry) = self.write().get_mut(&session.session_id) {
            *entry = session.status();
        }
    }

    /// Status of an active session.
    pub fn get(&self, session_id: &str) -> Option<SessionStatus> {
        self.read().get(session_id).cloned()
    }

    /// Whether a session is active.
    pub fn contains(&self, session_id: &str) -> bool {
        self.read().contains_key(session_id)
    }

    /// Identifiers of all active sessions, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no session is active.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn remove(&self, session_id: &str) {
        if self.write().remove(session_id).is_some() {
            debug!(session_id = %session_id, "Session removed");
        }
    }
}

/// Removes its session from the registry on drop, on every exit path
/// including panics and cancellation of the owning future.
#[derive(Debug)]
pub struct SessionGuard {
    registry: SessionRegistry,
    session_id: String,
}

impl SessionGuard {
    /// The guarded session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids = SessionIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(a.starts_with("session_1_"));
        assert!(b.starts_with("session_2_"));
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let registry = SessionRegistry::new();
        let session = ResearchSession::new("s1", "query");
        {
            let guard = registry.register(&session);
            assert_eq!(guard.session_id(), "s1");
            assert!(registry.contains("s1"));
        }
        assert!(!registry.contains("s1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_publish_updates_only_own_entry() {
        let registry = SessionRegistry::new();
        let mut a = ResearchSession::new("a", "same query");
        let b = ResearchSession::new("b", "same query");
        let _ga = registry.register(&a);
        let _gb = registry.register(&b);

        a.progress.begin_stage(ResearchStage::WebSearch);
        a.progress.complete_stage(ResearchStage::QueryAnalysis, 0.1);
        registry.publish(&a);

        assert_eq!(registry.get("a").unwrap().current_stage, ResearchStage::WebSearch);
        assert_eq!(registry.get("b").unwrap().current_stage, ResearchStage::QueryAnalysis);
        assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_publish_after_removal_does_not_resurrect() {
        let registry = SessionRegistry::new();
        let session = ResearchSession::new("gone", "q");
        drop(registry.register(&session));
        registry.publish(&session);
        assert!(registry.get("gone").is_none());
    }

    #[test]
    fn test_apply_source_assessments() {
        let mut session = ResearchSession::new("s", "q");
        session.sources = vec![
            Source::new("https://a", "A"),
            Source::new("https://b", "B"),
        ];
        let updated = session.apply_source_assessments(&[
            SourceAssessment {
                url: "https://b".to_string(),
                credibility_score: 0.9,
            },
            SourceAssessment {
                url: "https://unknown".to_string(),
                credibility_score: 0.1,
            },
        ]);
        assert_eq!(updated, 1);
        assert_eq!(session.sources.len(), 2);
        assert_eq!(session.sources[1].credibility_score, 0.9);
        assert_eq!(session.sources[0].credibility_score, 0.5);
    }
}
