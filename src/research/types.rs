//! Typed payloads exchanged between the orchestrator and its collaborators.
//!
//! Every collaborator output is deserialized into one of these types with
//! explicit serde defaults, so missing fields in a model's JSON become
//! documented defaults instead of silent shape drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_priority() -> u32 {
    1
}

fn default_credibility() -> f64 {
    0.5
}

fn default_verification_confidence() -> f64 {
    0.5
}

fn default_trust_level() -> String {
    "medium".to_string()
}

fn default_metadata() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

// ============================================================================
// Query analysis
// ============================================================================

/// Query complexity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryComplexity {
    /// Single-fact lookup.
    Simple,
    /// Needs a few sources.
    #[default]
    Medium,
    /// Multi-part or comparative research.
    Complex,
}

/// Entity extracted from a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entity {
    /// Surface text of the entity.
    pub name: String,
    /// PERSON, ORG, LOCATION, DATE, CONCEPT, PRODUCT, EVENT.
    #[serde(alias = "type")]
    pub entity_type: String,
    /// `primary` or `secondary`.
    pub relevance: String,
}

/// A sub-query derived from the main query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuery {
    /// Search text.
    pub query: String,
    /// Why this sub-query is needed.
    #[serde(default)]
    pub purpose: String,
    /// Lower is more important.
    #[serde(default = "default_priority")]
    pub priority: u32,
}

impl SubQuery {
    /// Create a sub-query with default purpose and priority.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            purpose: String::new(),
            priority: default_priority(),
        }
    }
}

/// Analyzed query structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryAnalysis {
    /// Unique analysis identifier.
    #[serde(default = "new_id")]
    pub id: String,
    /// The query exactly as submitted.
    #[serde(default)]
    pub raw_query: String,
    /// What the user wants to learn.
    #[serde(default)]
    pub intent: String,
    /// Subject domain (e.g. "technology", "health").
    #[serde(default)]
    pub domain: String,
    /// Named entities in the query.
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Estimated complexity.
    #[serde(default)]
    pub complexity: QueryComplexity,
    /// Time range the query is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_scope: Option<String>,
    /// Decomposed sub-queries to search.
    #[serde(default)]
    pub sub_queries: Vec<SubQuery>,
    /// When the analysis was produced.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl QueryAnalysis {
    /// Minimal analysis for a query: a single sub-query equal to the query.
    pub fn for_query(query: impl Into<String>) -> Self {
        let query = query.into();
        Self {
            id: new_id(),
            sub_queries: vec![SubQuery::new(query.clone())],
            raw_query: query,
            intent: String::new(),
            domain: "general".to_string(),
            entities: Vec::new(),
            complexity: QueryComplexity::default(),
            temporal_scope: None,
            created_at: Utc::now(),
        }
    }

    /// Add a sub-query.
    pub fn with_sub_query(mut self, query: impl Into<String>) -> Self {
        self.sub_queries.push(SubQuery::new(query));
        self
    }
}

// ============================================================================
// Sources
// ============================================================================

/// Discrete credibility level derived from a credibility score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredibilityLevel {
    /// Score >= 0.8.
    High,
    /// Score >= 0.5.
    #[default]
    Medium,
    /// Score < 0.5.
    Low,
}

impl CredibilityLevel {
    /// Derive the level from a score.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            CredibilityLevel::High
        } else if score >= 0.5 {
            CredibilityLevel::Medium
        } else {
            CredibilityLevel::Low
        }
    }

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CredibilityLevel::High => "high",
            CredibilityLevel::Medium => "medium",
            CredibilityLevel::Low => "low",
        }
    }
}

impl std::fmt::Display for CredibilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A retrieved document reference.
///
/// The URL is the identity of a source within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Unique source identifier.
    #[serde(default = "new_id")]
    pub id: String,
    /// Document URL.
    pub url: String,
    /// Document title.
    #[serde(default)]
    pub title: String,
    /// Extracted content (falls back to the snippet).
    #[serde(default)]
    pub content: String,
    /// Search snippet.
    #[serde(default)]
    pub snippet: String,
    /// Host part of the URL.
    #[serde(default)]
    pub domain: String,
    /// Credibility estimate in `[0, 1]`.
    #[serde(default = "default_credibility")]
    pub credibility_score: f64,
    /// Level derived from `credibility_score`.
    #[serde(default)]
    pub credibility_level: CredibilityLevel,
    /// When the source was retrieved.
    #[serde(default = "Utc::now")]
    pub retrieved_at: DateTime<Utc>,
    /// Provider-specific extras.
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

impl Source {
    /// Create a source with default credibility.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            url: url.into(),
            title: title.into(),
            content: String::new(),
            snippet: String::new(),
            domain: String::new(),
            credibility_score: default_credibility(),
            credibility_level: CredibilityLevel::from_score(default_credibility()),
            retrieved_at: Utc::now(),
            metadata: default_metadata(),
        }
    }

    /// Set content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Set domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set credibility (clamped) and the derived level.
    pub fn with_credibility(mut self, score: f64) -> Self {
        self.set_credibility(score);
        self
    }

    /// Revise credibility in place, keeping the level in sync.
    pub fn set_credibility(&mut self, score: f64) {
        let score = if score.is_finite() {
            score.clamp(0.0, 1.0)
        } else {
            default_credibility()
        };
        self.credibility_score = score;
        self.credibility_level = CredibilityLevel::from_score(score);
    }
}

// ============================================================================
// Reasoning
// ============================================================================

/// A step in the reasoning chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningStep {
    /// 1-based position in the chain.
    pub step_number: u32,
    /// The reasoning itself.
    pub thought: String,
    /// Evidence the step relies on.
    pub evidence: String,
    /// What the step concludes.
    pub conclusion: String,
}

/// Output of the reasoning stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOutput {
    /// Synthesized narrative.
    pub synthesis: String,
    /// Claims to verify.
    pub key_findings: Vec<String>,
    /// Chain of reasoning.
    pub reasoning_steps: Vec<ReasoningStep>,
    /// Information gaps.
    pub gaps: Vec<String>,
    /// Model's own confidence, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// ============================================================================
// Verification
// ============================================================================

/// Verification status of a single claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Supported by multiple sources.
    Verified,
    /// Partly supported.
    PartiallyVerified,
    /// Not checked or no support found.
    #[default]
    Unverified,
    /// Contradicted by sources.
    Disputed,
}

/// A claim with its verification outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Claim {
    /// Claim text.
    pub content: String,
    /// Verification outcome.
    pub status: ClaimStatus,
    /// Confidence in the outcome.
    pub confidence: f64,
    /// URLs of supporting sources.
    pub supporting_sources: Vec<String>,
}

/// Conflicting information between sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conflict {
    /// What the conflict is about.
    pub topic: String,
    /// factual, interpretive, temporal, scope.
    pub conflict_type: String,
    /// low, medium, high.
    pub severity: String,
}

/// Revised credibility for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAssessment {
    /// URL of the assessed source.
    pub url: String,
    /// New credibility score.
    #[serde(alias = "overall_score")]
    pub credibility_score: f64,
}

/// Output of the verification stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Verifier's overall confidence in `[0, 1]`.
    #[serde(default = "default_verification_confidence")]
    pub overall_confidence: f64,
    /// high, medium, low.
    #[serde(default = "default_trust_level")]
    pub trust_level: String,
    /// Per-claim outcomes.
    #[serde(default)]
    pub claims: Vec<Claim>,
    /// Detected conflicts.
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    /// Caveats for the reader.
    #[serde(default)]
    pub caveats: Vec<String>,
    /// Credibility revisions to apply to session sources.
    #[serde(default)]
    pub source_assessments: Vec<SourceAssessment>,
}

impl Default for VerificationResult {
    fn default() -> Self {
        Self {
            overall_confidence: default_verification_confidence(),
            trust_level: default_trust_level(),
            claims: Vec::new(),
            conflicts: Vec::new(),
            caveats: Vec::new(),
            source_assessments: Vec::new(),
        }
    }
}

// ============================================================================
// Citations and output
// ============================================================================

/// A formatted citation for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Citation {
    /// URL of the cited source.
    pub url: String,
    /// Full reference entry.
    pub formatted: String,
    /// In-text marker, e.g. "(Smith, 2023)".
    pub in_text: String,
}

/// Output of the citation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationBundle {
    /// Citation style used.
    pub style: String,
    /// One entry per cited source.
    pub citations: Vec<Citation>,
    /// Rendered reference list.
    pub bibliography: String,
}

/// Output of the output-generation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportBundle {
    /// Short answer to the query.
    pub summary: String,
    /// Full report in the requested output format.
    pub report: String,
    /// Suggested follow-up questions.
    pub followup_questions: Vec<String>,
}

/// Everything the output stage needs to write the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Findings {
    /// Reasoning output.
    pub synthesis: Option<SynthesisOutput>,
    /// Verification output, absent when verification was skipped.
    pub verification: Option<VerificationResult>,
    /// Reasoning chain.
    pub reasoning_steps: Vec<ReasoningStep>,
    /// Information gaps.
    pub information_gaps: Vec<String>,
}

/// Content produced by the degraded-output path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackContent {
    /// Best-effort answer.
    #[serde(default)]
    pub response: String,
    /// Generator's confidence in the response.
    #[serde(default)]
    pub confidence: f64,
    /// Fraction of the question the response covers.
    #[serde(default)]
    pub completeness: f64,
    /// What is missing from the response.
    #[serde(default)]
    pub limitations: Vec<String>,
}

// ============================================================================
// Final result
// ============================================================================

/// Verification status of a final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Verification stage ran.
    Verified,
    /// Verification stage was skipped.
    Unverified,
    /// The pipeline failed and the result is degraded.
    Failed,
}

impl VerificationStatus {
    /// Get the status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verified" => Ok(VerificationStatus::Verified),
            "unverified" => Ok(VerificationStatus::Unverified),
            "failed" => Ok(VerificationStatus::Failed),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

/// Source reference as exposed in a final result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSource {
    /// Document title.
    pub title: String,
    /// Document URL.
    pub url: String,
    /// Final credibility score.
    pub credibility_score: f64,
}

impl From<&Source> for ResultSource {
    fn from(source: &Source) -> Self {
        Self {
            title: source.title.clone(),
            url: source.url.clone(),
            credibility_score: source.credibility_score,
        }
    }
}

/// Final outcome of a research run, complete or degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchResult {
    /// The query as submitted.
    pub query: String,
    /// Answer text. Never empty.
    pub answer: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Sources the answer is based on.
    pub sources: Vec<ResultSource>,
    /// Reasoning chain, when reasoning ran.
    #[serde(default)]
    pub reasoning_steps: Vec<ReasoningStep>,
    /// verified, unverified or failed.
    pub verification_status: VerificationStatus,
    /// Free-form details (report, citations, timings, failure info).
    pub metadata: serde_json::Value,
}

impl ResearchResult {
    /// Whether this is a degraded, partial result.
    pub fn is_partial(&self) -> bool {
        self.metadata
            .get("partial")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Error message that triggered degradation, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.metadata.get("error").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_credibility_level_thresholds() {
        assert_eq!(CredibilityLevel::from_score(0.95), CredibilityLevel::High);
        assert_eq!(CredibilityLevel::from_score(0.8), CredibilityLevel::High);
        assert_eq!(CredibilityLevel::from_score(0.79), CredibilityLevel::Medium);
        assert_eq!(CredibilityLevel::from_score(0.5), CredibilityLevel::Medium);
        assert_eq!(CredibilityLevel::from_score(0.49), CredibilityLevel::Low);
    }

    #[test]
    fn test_source_credibility_is_clamped_and_level_synced() {
        let mut source = Source::new("https://a.gov/x", "A").with_credibility(1.7);
        assert_eq!(source.credibility_score, 1.0);
        assert_eq!(source.credibility_level, CredibilityLevel::High);

        source.set_credibility(0.2);
        assert_eq!(source.credibility_level, CredibilityLevel::Low);

        source.set_credibility(f64::NAN);
        assert_eq!(source.credibility_score, 0.5);
    }

    #[test]
    fn test_query_analysis_defaults_from_sparse_json() {
        let analysis: QueryAnalysis = serde_json::from_value(json!({
            "intent": "compare",
            "sub_queries": [{"query": "rust vs go"}]
        }))
        .unwrap();

        assert_eq!(analysis.intent, "compare");
        assert_eq!(analysis.complexity, QueryComplexity::Medium);
        assert_eq!(analysis.sub_queries[0].priority, 1);
        assert!(!analysis.id.is_empty());
    }

    #[test]
    fn test_verification_defaults() {
        let result: VerificationResult = serde_json::from_value(json!({})).unwrap();
        assert_eq!(result.overall_confidence, 0.5);
        assert_eq!(result.trust_level, "medium");

        let result: VerificationResult = serde_json::from_value(json!({
            "overall_confidence": 0.9,
            "source_assessments": [{"url": "https://a", "overall_score": 0.3}]
        }))
        .unwrap();
        assert_eq!(result.source_assessments[0].credibility_score, 0.3);
    }

    #[test]
    fn test_entity_accepts_type_alias() {
        let entity: Entity =
            serde_json::from_value(json!({"name": "Rust", "type": "CONCEPT"})).unwrap();
        assert_eq!(entity.entity_type, "CONCEPT");
    }

    #[test]
    fn test_verification_status_serde() {
        assert_eq!(
            serde_json::to_value(VerificationStatus::Failed).unwrap(),
            json!("failed")
        );
        assert_eq!("VERIFIED".parse::<VerificationStatus>(), Ok(VerificationStatus::Verified));
    }

    #[test]
    fn test_result_partial_flag() {
        let result = ResearchResult {
            query: "q".to_string(),
            answer: "a".to_string(),
            confidence: 0.2,
            sources: vec![],
            reasoning_steps: vec![],
            verification_status: VerificationStatus::Failed,
            metadata: json!({"partial": true, "error": "boom"}),
        };
        assert!(result.is_partial());
        assert_eq!(result.error_message(), Some("boom"));
    }
}
