use serde::{Deserialize, Serialize};

/// Stages of the research pipeline, in execution order.
///
/// `Verification` is the only stage that may be skipped. `Complete` is
/// terminal and never executed as a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStage {
    /// Analyze and decompose the query.
    QueryAnalysis,
    /// Retrieve sources for the query and its sub-queries.
    WebSearch,
    /// Synthesize findings from the sources.
    Reasoning,
    /// Verify claims and revise source credibility.
    Verification,
    /// Generate citations.
    Citation,
    /// Produce the final report and answer.
    OutputGeneration,
    /// Terminal state.
    Complete,
}

impl ResearchStage {
    /// Every stage in canonical order, including `Complete`.
    pub const ALL: [ResearchStage; 7] = [
        ResearchStage::QueryAnalysis,
        ResearchStage::WebSearch,
        ResearchStage::Reasoning,
        ResearchStage::Verification,
        ResearchStage::Citation,
        ResearchStage::OutputGeneration,
        ResearchStage::Complete,
    ];

    /// Number of executable stages (everything except `Complete`).
    pub const EXECUTABLE_COUNT: usize = Self::ALL.len() - 1;

    /// Get the stage name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ResearchStage::QueryAnalysis => "query_analysis",
            ResearchStage::WebSearch => "web_search",
            ResearchStage::Reasoning => "reasoning",
            ResearchStage::Verification => "verification",
            ResearchStage::Citation => "citation",
            ResearchStage::OutputGeneration => "output_generation",
            ResearchStage::Complete => "complete",
        }
    }

    /// Position in the canonical order.
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Whether the pipeline may skip this stage.
    pub fn is_optional(&self) -> bool {
        matches!(self, ResearchStage::Verification)
    }

    /// Whether this is the terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResearchStage::Complete)
    }

    /// The next stage in canonical order, if any.
    pub fn next(&self) -> Option<ResearchStage> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

impl std::fmt::Display for ResearchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ResearchStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "query_analysis" => Ok(ResearchStage::QueryAnalysis),
            "web_search" => Ok(ResearchStage::WebSearch),
            "reasoning" => Ok(ResearchStage::Reasoning),
            "verification" => Ok(ResearchStage::Verification),
            "citation" => Ok(ResearchStage::Citation),
            "output_generation" => Ok(ResearchStage::OutputGeneration),
            "complete" => Ok(ResearchStage::Complete),
            _ => Err(format!("Unknown research stage: {}", s)),
        }
    }
}

/// Whether `completed` is a valid execution history: canonical order, no
/// repeats, no `Complete`, and no gap other than a skipped verification.
pub fn is_canonical_prefix(completed: &[ResearchStage]) -> bool {
    let mut expected = ResearchStage::QueryAnalysis;
    for stage in completed {
        if *stage != expected {
            if expected.is_optional() && Some(*stage) == expected.next() {
                expected = *stage;
            } else {
                return false;
            }
        }
        if stage.is_terminal() {
            return false;
        }
        match stage.next() {
            Some(next) => expected = next,
            None => return false,
        }
    }
    true
}
