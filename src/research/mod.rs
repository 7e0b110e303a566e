//! Multi-stage research orchestration.
//!
//! A run moves through query analysis, web search, reasoning, optional
//! verification, citation and output generation. The orchestrator owns the
//! stage order and bookkeeping; the actual work is delegated to
//! [`ResearchStages`] collaborators.

mod collaborators;
mod confidence;
mod degraded;
mod errors;
mod options;
mod orchestrator;
mod progress;
mod retry;
mod session;
mod stage;
mod types;

pub use collaborators::{FallbackContentGenerator, ResearchStages};
pub use confidence::{
    aggregate as aggregate_confidence, ConfidenceInputs, DEFAULT_TARGET_SOURCE_COUNT,
    ERROR_PENALTY_PER_ERROR, NEUTRAL_CONFIDENCE,
};
pub use degraded::{degraded_result, APOLOGY_MESSAGE, DEGRADED_CONFIDENCE};
pub use errors::{
    ComponentType, ErrorContext, ErrorDigest, ErrorHandler, ErrorRecord, ErrorSeverity,
    ErrorSummary, DEFAULT_ERROR_HISTORY_CAPACITY,
};
pub use options::{Audience, CitationStyle, OutputFormat, ResearchOptions};
pub use orchestrator::{ProgressCallback, ResearchOrchestrator};
pub use progress::ResearchProgress;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use session::{
    ResearchSession, SessionGuard, SessionIdGenerator, SessionRegistry, SessionStatus,
};
pub use stage::{is_canonical_prefix, ResearchStage};
pub use types::{
    Citation, CitationBundle, Claim, ClaimStatus, Conflict, CredibilityLevel, Entity,
    FallbackContent, Findings, QueryAnalysis, QueryComplexity, ReasoningStep, ReportBundle,
    ResearchResult, ResultSource, Source, SourceAssessment, SubQuery, SynthesisOutput,
    VerificationResult, VerificationStatus,
};
