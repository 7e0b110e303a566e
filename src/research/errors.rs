//! Bounded error history for diagnostics.
//!
//! Records are kept in a FIFO capped at [`DEFAULT_ERROR_HISTORY_CAPACITY`];
//! the oldest record is evicted first. This is diagnostic state, not an
//! audit log.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::ResearchError;

/// Default number of records retained.
pub const DEFAULT_ERROR_HISTORY_CAPACITY: usize = 100;

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    /// Informational.
    Info,
    /// Recoverable problem.
    Warning,
    /// Operation failed.
    Error,
    /// Run could not produce a normal result.
    Critical,
}

impl ErrorSeverity {
    /// Get the severity as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSeverity::Info => "info",
            ErrorSeverity::Warning => "warning",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Critical => "critical",
        }
    }
}

/// System component types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// Query analysis collaborator.
    QueryUnderstanding,
    /// Search collaborator.
    WebSearch,
    /// Reasoning collaborator.
    ReasoningEngine,
    /// Verification collaborator.
    Verification,
    /// Citation collaborator.
    Citation,
    /// Output collaborator.
    OutputGeneration,
    /// LLM fallback client.
    LlmClient,
    /// The orchestrator itself.
    Orchestrator,
}

impl ComponentType {
    /// Get the component name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::QueryUnderstanding => "query_understanding",
            ComponentType::WebSearch => "web_search",
            ComponentType::ReasoningEngine => "reasoning_engine",
            ComponentType::Verification => "verification",
            ComponentType::Citation => "citation",
            ComponentType::OutputGeneration => "output_generation",
            ComponentType::LlmClient => "llm_client",
            ComponentType::Orchestrator => "orchestrator",
        }
    }
}

impl From<super::ResearchStage> for ComponentType {
    fn from(stage: super::ResearchStage) -> Self {
        use super::ResearchStage;
        match stage {
            ResearchStage::QueryAnalysis => ComponentType::QueryUnderstanding,
            ResearchStage::WebSearch => ComponentType::WebSearch,
            ResearchStage::Reasoning => ComponentType::ReasoningEngine,
            ResearchStage::Verification => ComponentType::Verification,
            ResearchStage::Citation => ComponentType::Citation,
            ResearchStage::OutputGeneration => ComponentType::OutputGeneration,
            ResearchStage::Complete => ComponentType::Orchestrator,
        }
    }
}

/// Where and when an error happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Component that raised the error.
    pub component: ComponentType,
    /// Operation being performed.
    pub operation: String,
    /// Query being researched, if known.
    pub query: Option<String>,
    /// 1-based attempt number.
    pub attempt_number: u32,
    /// Attempts allowed.
    pub max_attempts: u32,
    /// Snapshot of partial results at failure time.
    pub partial_results: Option<serde_json::Value>,
    /// When the context was captured.
    pub timestamp: DateTime<Utc>,
}

impl ErrorContext {
    /// Create a context for a first attempt.
    pub fn new(component: ComponentType, operation: impl Into<String>) -> Self {
        Self {
            component,
            operation: operation.into(),
            query: None,
            attempt_number: 1,
            max_attempts: 1,
            partial_results: None,
            timestamp: Utc::now(),
        }
    }

    /// Set the query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set attempt counters.
    pub fn with_attempt(mut self, attempt_number: u32, max_attempts: u32) -> Self {
        self.attempt_number = attempt_number;
        self.max_attempts = max_attempts;
        self
    }

    /// Attach partial results.
    pub fn with_partial_results(mut self, partial: serde_json::Value) -> Self {
        self.partial_results = Some(partial);
        self
    }
}

/// One recorded error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Error kind name.
    pub error_type: String,
    /// Error message.
    pub message: String,
    /// Where it happened.
    pub context: ErrorContext,
    /// How bad it was.
    pub severity: ErrorSeverity,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Compact view of a record used in summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDigest {
    /// Error kind name.
    pub error_type: String,
    /// Error message.
    pub message: String,
    /// Component name.
    pub component: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

/// Aggregate statistics over the retained history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Records currently retained.
    pub total_errors: usize,
    /// Count per severity name.
    pub by_severity: BTreeMap<String, usize>,
    /// Count per component name.
    pub by_component: BTreeMap<String, usize>,
    /// The five most recent records, oldest first.
    pub recent_errors: Vec<ErrorDigest>,
}

/// Thread-safe bounded error history shared by all sessions.
#[derive(Debug)]
pub struct ErrorHandler {
    history: Mutex<VecDeque<ErrorRecord>>,
    capacity: usize,
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorHandler {
    /// Create a handler with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ERROR_HISTORY_CAPACITY)
    }

    /// Create a handler retaining at most `capacity` records (minimum one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ErrorRecord>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a stage error.
    pub fn record_error(
        &self,
        err: &ResearchError,
        context: ErrorContext,
        severity: ErrorSeverity,
    ) -> ErrorRecord {
        self.record(err.kind(), err.to_string(), context, severity)
    }

    /// Record an arbitrary error by kind name and message.
    pub fn record(
        &self,
        error_type: impl Into<String>,
        message: impl Into<String>,
        context: ErrorContext,
        severity: ErrorSeverity,
    ) -> ErrorRecord {
        let record = ErrorRecord {
            error_type: error_type.into(),
            message: message.into(),
            context,
            severity,
            timestamp: Utc::now(),
        };

        match severity {
            ErrorSeverity::Info => info!(
                component = record.context.component.as_str(),
                error = %record.message,
                "Recorded error"
            ),
            ErrorSeverity::Warning => warn!(
                component = record.context.component.as_str(),
                error = %record.message,
                "Recorded error"
            ),
            ErrorSeverity::Error | ErrorSeverity::Critical => error!(
                component = record.context.component.as_str(),
                severity = severity.as_str(),
                error = %record.message,
                "Recorded error"
            ),
        }

        let mut history = self.lock();
        while history.len() >= self.capacity {
            history.pop_front();
        }
        history.push_back(record.clone());

        record
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no records are retained.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of retained records.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ErrorRecord> {
        let history = self.lock();
        let skip = history.len().saturating_sub(n);
        history.iter().skip(skip).cloned().collect()
    }

    /// Summary statistics over the retained history.
    pub fn error_summary(&self) -> ErrorSummary {
        let history = self.lock();
        let mut summary = ErrorSummary {
            total_errors: history.len(),
            ..ErrorSummary::default()
        };

        for record in history.iter() {
            *summary
                .by_severity
                .entry(record.severity.as_str().to_string())
                .or_insert(0) += 1;
            *summary
                .by_component
                .entry(record.context.component.as_str().to_string())
                .or_insert(0) += 1;
        }

        let skip = history.len().saturating_sub(5);
        summary.recent_errors = history
            .iter()
            .skip(skip)
            .map(|r| ErrorDigest {
                error_type: r.error_type.clone(),
                message: r.message.clone(),
                component: r.context.component.as_str().to_string(),
                timestamp: r.timestamp.to_rfc3339(),
            })
            .collect();

        summary
    }

    /// Health score in `[0, 1]` falling with the number of retained errors.
    pub fn health_score(&self) -> f64 {
        (1.0 - self.len() as f64 / self.capacity as f64).max(0.0)
    }

    /// Drop every retained record.
    pub fn clear_history(&self) {
        self.lock().clear();
        info!("Error history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(component: ComponentType) -> ErrorContext {
        ErrorContext::new(component, "test_op")
    }

    #[test]
    fn test_history_is_bounded_fifo() {
        let handler = ErrorHandler::with_capacity(3);
        for i in 0..5 {
            handler.record("Test", format!("error {}", i), ctx(ComponentType::WebSearch), ErrorSeverity::Error);
        }

        assert_eq!(handler.len(), 3);
        let messages: Vec<_> = handler.recent(10).into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["error 2", "error 3", "error 4"]);
    }

    #[test]
    fn test_record_error_uses_kind() {
        let handler = ErrorHandler::new();
        let err = ResearchError::missing("Synthesis");
        let record = handler.record_error(
            &err,
            ctx(ComponentType::Verification).with_query("q"),
            ErrorSeverity::Warning,
        );
        assert_eq!(record.error_type, "MissingInput");
        assert_eq!(record.message, "Synthesis not available");
        assert_eq!(record.context.query.as_deref(), Some("q"));
    }

    #[test]
    fn test_summary_counts() {
        let handler = ErrorHandler::new();
        handler.record("A", "1", ctx(ComponentType::WebSearch), ErrorSeverity::Error);
        handler.record("A", "2", ctx(ComponentType::WebSearch), ErrorSeverity::Warning);
        handler.record("B", "3", ctx(ComponentType::Citation), ErrorSeverity::Error);

        let summary = handler.error_summary();
        assert_eq!(summary.total_errors, 3);
        assert_eq!(summary.by_severity.get("error"), Some(&2));
        assert_eq!(summary.by_component.get("web_search"), Some(&2));
        assert_eq!(summary.recent_errors.len(), 3);
        assert_eq!(summary.recent_errors[2].message, "3");
    }

    #[test]
    fn test_empty_summary_and_clear() {
        let handler = ErrorHandler::new();
        assert_eq!(handler.error_summary(), ErrorSummary::default());
        assert_eq!(handler.health_score(), 1.0);

        handler.record("A", "x", ctx(ComponentType::Orchestrator), ErrorSeverity::Critical);
        assert!(!handler.is_empty());
        handler.clear_history();
        assert!(handler.is_empty());
    }

    #[test]
    fn test_health_score_uses_handler_capacity() {
        let handler = ErrorHandler::with_capacity(10);
        for i in 0..5 {
            handler.record("A", i.to_string(), ctx(ComponentType::WebSearch), ErrorSeverity::Error);
        }
        assert_eq!(handler.health_score(), 0.5);

        for i in 5..12 {
            handler.record("A", i.to_string(), ctx(ComponentType::WebSearch), ErrorSeverity::Error);
        }
        assert_eq!(handler.len(), 10);
        assert_eq!(handler.health_score(), 0.0);
    }

    #[test]
    fn test_stage_to_component() {
        use crate::research::ResearchStage;
        assert_eq!(
            ComponentType::from(ResearchStage::WebSearch),
            ComponentType::WebSearch
        );
        assert_eq!(
            ComponentType::from(ResearchStage::Reasoning),
            ComponentType::ReasoningEngine
        );
    }
}
