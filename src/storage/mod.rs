//! Storage layer for finished research runs.
//!
//! Live session state is never stored here; only the final result of each
//! run is written once, after the run ends.

mod sqlite;


pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::research::{ResearchResult, ResearchStage, VerificationStatus};

/// Outcome of a stored run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// All stages ran.
    Complete,
    /// A stage failed and the result is degraded.
    Partial,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Complete => write!(f, "complete"),
            RunStatus::Partial => write!(f, "partial"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "complete" => Ok(RunStatus::Complete),
            "partial" => Ok(RunStatus::Partial),
            _ => Err(format!("Unknown run status: {}", s)),
        }
    }
}

/// A persisted research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Session identifier of the run.
    pub session_id: String,
    /// The researched query.
    pub query: String,
    /// Complete or partial.
    pub status: RunStatus,
    /// Final confidence.
    pub confidence: f64,
    /// Verification status of the result.
    pub verification_status: VerificationStatus,
    /// Stages that completed, in order.
    pub stages_completed: Vec<ResearchStage>,
    /// Wall-clock duration of the run in seconds.
    pub duration_secs: f64,
    /// Error that degraded the run, if any.
    pub error: Option<String>,
    /// The full result.
    pub result: ResearchResult,
    /// When the run was stored.
    pub created_at: DateTime<Utc>,
}

impl RunRecord {
    /// Build a record from a finished run.
    pub fn new(
        session_id: impl Into<String>,
        result: &ResearchResult,
        stages_completed: &[ResearchStage],
        duration_secs: f64,
    ) -> Self {
        let status = if result.is_partial() {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        };

        Self {
            session_id: session_id.into(),
            query: result.query.clone(),
            status,
            confidence: result.confidence,
            verification_status: result.verification_status,
            stages_completed: stages_completed.to_vec(),
            duration_secs,
            error: result.error_message().map(str::to_string),
            result: result.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Persistence for research runs.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Save a run, replacing any run with the same session id.
    async fn save_run(&self, record: &RunRecord) -> StorageResult<()>;
    /// Get a run by session id.
    async fn get_run(&self, session_id: &str) -> StorageResult<Option<RunRecord>>;
    /// Most recent runs first.
    async fn list_recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>>;
    /// Delete a run. Fails with `RunNotFound` when absent.
    async fn delete_run(&self, session_id: &str) -> StorageResult<()>;
}
