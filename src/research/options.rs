use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;
use crate::config::ResearchConfig;

/// Target audience of the generated report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Non-specialist readers.
    #[default]
    General,
    /// Researchers and students.
    Academic,
    /// Practitioners who want detail.
    Technical,
    /// Decision makers who want the bottom line.
    Executive,
}

impl Audience {
    /// Get the audience name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::General => "general",
            Audience::Academic => "academic",
            Audience::Technical => "technical",
            Audience::Executive => "executive",
        }
    }
}

/// Citation style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum CitationStyle {
    /// American Psychological Association.
    #[default]
    Apa,
    /// Modern Language Association.
    Mla,
    /// Chicago Manual of Style.
    Chicago,
    /// IEEE numbered references.
    Ieee,
    /// Harvard author-date.
    Harvard,
}

impl CitationStyle {
    /// Get the style name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CitationStyle::Apa => "APA",
            CitationStyle::Mla => "MLA",
            CitationStyle::Chicago => "CHICAGO",
            CitationStyle::Ieee => "IEEE",
            CitationStyle::Harvard => "HARVARD",
        }
    }
}

/// Report output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text.
    Text,
    /// Markdown.
    #[default]
    Markdown,
    /// HTML.
    Html,
    /// JSON document.
    Json,
}

impl OutputFormat {
    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl std::fmt::Display for $ty {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )*
    };
}

impl_display!(Audience, CitationStyle, OutputFormat);

/// Per-run options for [`ResearchOrchestrator::research`](super::ResearchOrchestrator::research).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchOptions {
    /// Target audience.
    pub audience: Audience,
    /// Citation style.
    pub citation_style: CitationStyle,
    /// Report format.
    pub output_format: OutputFormat,
    /// Maximum sources kept after de-duplication.
    pub max_sources: usize,
    /// Run the verification stage.
    pub verify_claims: bool,
    /// Retry policy wrapped around each stage call. `None` runs each stage once.
    pub stage_retry: Option<RetryPolicy>,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            audience: Audience::default(),
            citation_style: CitationStyle::default(),
            output_format: OutputFormat::default(),
            max_sources: 10,
            verify_claims: true,
            stage_retry: None,
        }
    }
}

impl ResearchOptions {
    /// Options seeded from configured defaults.
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self {
            max_sources: config.max_sources,
            verify_claims: config.verify_claims,
            ..Self::default()
        }
    }

    /// Enable or disable claim verification.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_claims = verify;
        self
    }

    /// Set the source cap (at least one).
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources.max(1);
        self
    }

    /// Set the audience.
    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    /// Set the citation style.
    pub fn with_citation_style(mut self, style: CitationStyle) -> Self {
        self.citation_style = style;
        self
    }

    /// Set the output format.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Retry every stage call with the given policy.
    pub fn with_stage_retry(mut self, policy: RetryPolicy) -> Self {
        self.stage_retry = Some(policy);
        self
    }
}
