//! # Deep Research
//!
//! Multi-stage web research: a query is analyzed, searched, reasoned over,
//! optionally fact-checked, cited and written up as a report. Every stage
//! failure degrades the run to a best-effort partial answer instead of an
//! error.
//!
//! ## Architecture
//!
//! ```text
//! CLI → ResearchOrchestrator → LlmResearchStages → FallbackLlmClient    (OpenAI → Anthropic)
//!              ↓                                  → FallbackSearchClient (Tavily → Serper)
//!       SQLite (finished runs)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use deep_research::{Config, LlmResearchStages, ResearchOptions, ResearchOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let stages = Arc::new(LlmResearchStages::from_config(&config)?);
//!     let orchestrator = ResearchOrchestrator::new(stages.clone(), stages);
//!     let result = orchestrator
//!         .research("Why is the sky blue?", ResearchOptions::from_config(&config.research))
//!         .await;
//!     println!("{}", result.answer);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Command-line interface.
pub mod cli;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// LLM backends and failover client.
pub mod llm;
/// Prompt templates for the research stages.
pub mod prompts;
/// Research orchestration, sessions and payload types.
pub mod research;
/// Web search providers and failover client.
pub mod search;
/// LLM- and search-backed stage implementations.
pub mod stages;
/// SQLite storage layer for finished runs.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use research::{ResearchOptions, ResearchOrchestrator, ResearchResult};
pub use stages::LlmResearchStages;
