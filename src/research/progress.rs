//! Per-run stage bookkeeping and completion percentage.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::ResearchStage;

/// Progress of one research run.
///
/// `stages_completed`, `stage_times` and `errors` are append-only: a later
/// stage never overwrites an earlier stage's bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchProgress {
    /// Stage currently executing (or `Complete`).
    pub current_stage: ResearchStage,
    /// Stages that finished successfully, in execution order.
    pub stages_completed: Vec<ResearchStage>,
    /// Elapsed seconds per stage, keyed by stage name.
    pub stage_times: HashMap<String, f64>,
    /// Formatted `"{stage}: {message}"` entries for failed stages.
    pub errors: Vec<String>,
    /// When the run started.
    pub start_time: DateTime<Utc>,
}

impl Default for ResearchProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ResearchProgress {
    /// Fresh progress positioned at the first stage.
    pub fn new() -> Self {
        Self {
            current_stage: ResearchStage::QueryAnalysis,
            stages_completed: Vec::new(),
            stage_times: HashMap::new(),
            errors: Vec::new(),
            start_time: Utc::now(),
        }
    }

    /// Mark a stage as in flight.
    pub fn begin_stage(&mut self, stage: ResearchStage) {
        self.current_stage = stage;
    }

    /// Record a successful stage and its duration.
    pub fn complete_stage(&mut self, stage: ResearchStage, duration_secs: f64) {
        self.stages_completed.push(stage);
        self.stage_times
            .entry(stage.as_str().to_string())
            .or_insert(duration_secs);
    }

    /// Record a failed stage.
    pub fn record_failure(&mut self, stage: ResearchStage, message: &str, duration_secs: f64) {
        self.errors.push(format!("{}: {}", stage, message));
        self.stage_times
            .entry(stage.as_str().to_string())
            .or_insert(duration_secs);
    }

    /// Enter the terminal state.
    pub fn mark_complete(&mut self) {
        self.current_stage = ResearchStage::Complete;
    }

    /// Whether the run reached the terminal state.
    pub fn is_complete(&self) -> bool {
        self.current_stage.is_terminal()
    }

    /// Completion percentage in `[0, 100]`.
    ///
    /// Counts completed stages against the executable stage count. Only the
    /// terminal state reports 100; until then the value stays below it even
    /// when every executable stage has finished.
    pub fn progress_percentage(&self) -> f64 {
        if self.is_complete() {
            return 100.0;
        }
        let done = self
            .stages_completed
            .len()
            .min(ResearchStage::EXECUTABLE_COUNT - 1);
        (done as f64 / ResearchStage::EXECUTABLE_COUNT as f64) * 100.0
    }

    /// Seconds since the run started.
    pub fn elapsed_secs(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
