//! Command-line interface.
//!
//! `research` runs the pipeline and prints the result; `history` and `show`
//! read persisted runs.

use clap::{Parser, Subcommand};

use crate::research::{
    Audience, CitationStyle, OutputFormat, ProgressCallback, ResearchOptions, ResearchOrchestrator,
    ResearchResult, ResearchStage,
};
use crate::storage::{RunRecord, Storage};

/// Multi-stage web research from the command line.
#[derive(Parser, Debug)]
#[command(name = "deep-research", version, about)]
pub struct Cli {
    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Research a question
    Research {
        /// The question to research
        query: String,

        /// Skip claim verification
        #[arg(long)]
        no_verify: bool,

        /// Maximum number of sources to keep
        #[arg(long)]
        max_sources: Option<usize>,

        /// Target audience of the report
        #[arg(long, value_enum, default_value_t = Audience::General)]
        audience: Audience,

        /// Citation style
        #[arg(long, value_enum, default_value_t = CitationStyle::Apa)]
        style: CitationStyle,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recently stored runs
    History {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show one stored run
    Show {
        /// Session id of the run
        session_id: String,
    },
}

/// Result of CLI command execution.
pub struct CliResult {
    /// Exit code (0 = success)
    pub exit_code: i32,
    /// Output message
    pub message: String,
}

impl CliResult {
    /// Create a success result with the given message.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            message: message.into(),
        }
    }

    /// Create an error result with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            message: message.into(),
        }
    }
}

/// Build options for a `research` invocation on top of configured defaults.
pub fn research_options(
    defaults: ResearchOptions,
    no_verify: bool,
    max_sources: Option<usize>,
    audience: Audience,
    style: CitationStyle,
    format: OutputFormat,
) -> ResearchOptions {
    let mut options = defaults
        .with_audience(audience)
        .with_citation_style(style)
        .with_output_format(format);
    if no_verify {
        options = options.with_verification(false);
    }
    if let Some(max) = max_sources {
        options = options.with_max_sources(max);
    }
    options
}

/// Run a research command, printing stage progress to stderr.
///
/// A degraded result still exits 0: the pipeline answered, just partially.
pub async fn execute_research(
    orchestrator: &ResearchOrchestrator,
    query: &str,
    options: ResearchOptions,
    json: bool,
) -> CliResult {
    let progress: ProgressCallback<'_> = &|stage: ResearchStage, percent: f64| {
        eprintln!("[{:>3.0}%] {}", percent, stage);
    };

    let result = orchestrator
        .research_with_progress(query, options, Some(progress))
        .await;

    if json {
        return match serde_json::to_string_pretty(&result) {
            Ok(text) => CliResult::success(text),
            Err(e) => CliResult::error(format!("Failed to serialize result: {}", e)),
        };
    }

    CliResult::success(format_result(&result))
}

/// Print recent runs.
pub async fn execute_history(storage: &dyn Storage, limit: u32) -> CliResult {
    match storage.list_recent_runs(limit).await {
        Ok(runs) if runs.is_empty() => CliResult::success("No research runs stored."),
        Ok(runs) => CliResult::success(format_history(&runs)),
        Err(e) => CliResult::error(format!("Failed to list runs: {}", e)),
    }
}

/// Print one stored run.
pub async fn execute_show(storage: &dyn Storage, session_id: &str) -> CliResult {
    match storage.get_run(session_id).await {
        Ok(Some(record)) => CliResult::success(format_result(&record.result)),
        Ok(None) => CliResult::error(format!("Run not found: {}", session_id)),
        Err(e) => CliResult::error(format!("Failed to load run: {}", e)),
    }
}

/// Human-readable rendering of a result.
pub fn format_result(result: &ResearchResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("\nQuery: {}\n", result.query));
    output.push_str("═══════════════════════════════════════════════════════════════════════════════\n\n");
    output.push_str(&result.answer);
    output.push_str("\n\n");

    if let Some(report) = result.metadata.get("report").and_then(|r| r.as_str()) {
        if !report.trim().is_empty() && report.trim() != result.answer.trim() {
            output.push_str(report);
            output.push_str("\n\n");
        }
    }

    output.push_str(&format!(
        "Confidence: {:.0}%   Verification: {}\n",
        result.confidence * 100.0,
        result.verification_status
    ));

    if result.is_partial() {
        output.push_str(&format!(
            "Partial result: {}\n",
            result.error_message().unwrap_or("unknown error")
        ));
    }

    if !result.sources.is_empty() {
        output.push_str("\nSources:\n");
        for (i, source) in result.sources.iter().enumerate() {
            output.push_str(&format!(
                "  [{}] {} ({:.2})\n      {}\n",
                i + 1,
                source.title,
                source.credibility_score,
                source.url
            ));
        }
    }

    output
}

fn format_history(runs: &[RunRecord]) -> String {
    let mut output = String::new();
    output.push_str(&format!("\nRecent research runs: {}\n", runs.len()));
    output.push_str("═══════════════════════════════════════════════════════════════════════════════\n");

    for run in runs {
        output.push_str(&format!(
            "  {}  [{}] {:>3.0}%  {}  {}\n",
            run.created_at.format("%Y-%m-%d %H:%M"),
            run.status,
            run.confidence * 100.0,
            run.session_id,
            run.query
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::{ResultSource, VerificationStatus};
    use serde_json::json;

    fn result(metadata: serde_json::Value) -> ResearchResult {
        ResearchResult {
            query: "q".to_string(),
            answer: "The answer.".to_string(),
            confidence: 0.42,
            sources: vec![ResultSource {
                title: "A".to_string(),
                url: "https://a.org".to_string(),
                credibility_score: 0.6,
            }],
            reasoning_steps: vec![],
            verification_status: VerificationStatus::Unverified,
            metadata,
        }
    }

    #[test]
    fn test_cli_parses_research_flags() {
        let cli = Cli::try_parse_from([
            "deep-research",
            "research",
            "why is the sky blue",
            "--no-verify",
            "--max-sources",
            "4",
            "--style",
            "mla",
        ])
        .unwrap();

        match cli.command {
            Commands::Research {
                query,
                no_verify,
                max_sources,
                style,
                ..
            } => {
                assert_eq!(query, "why is the sky blue");
                assert!(no_verify);
                assert_eq!(max_sources, Some(4));
                assert_eq!(style, CitationStyle::Mla);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_research_options_overrides() {
        let options = research_options(
            ResearchOptions::default(),
            true,
            Some(3),
            Audience::Executive,
            CitationStyle::Ieee,
            OutputFormat::Json,
        );
        assert!(!options.verify_claims);
        assert_eq!(options.max_sources, 3);
        assert_eq!(options.audience, Audience::Executive);
        assert_eq!(options.citation_style, CitationStyle::Ieee);
    }

    #[test]
    fn test_format_result_shows_partial_error() {
        let text = format_result(&result(json!({"partial": true, "error": "web_search failed: down"})));
        assert!(text.contains("The answer."));
        assert!(text.contains("Confidence: 42%"));
        assert!(text.contains("Partial result: web_search failed: down"));
        assert!(text.contains("[1] A (0.60)"));
    }

    #[test]
    fn test_cli_result_codes() {
        assert_eq!(CliResult::success("ok").exit_code, 0);
        assert_eq!(CliResult::error("no").exit_code, 1);
    }
}
