use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deep_research::{
    cli::{self, Cli, CliResult, Commands},
    config::{Config, LogFormat},
    research::{ResearchOptions, ResearchOrchestrator},
    stages::LlmResearchStages,
    storage::{SqliteStorage, Storage},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Deep research starting...");

    let outcome = match cli.command {
        Commands::Research {
            query,
            no_verify,
            max_sources,
            audience,
            style,
            format,
            json,
        } => {
            let orchestrator = build_orchestrator(&config).await?;
            let options = cli::research_options(
                ResearchOptions::from_config(&config.research),
                no_verify,
                max_sources,
                audience,
                style,
                format,
            );
            cli::execute_research(&orchestrator, &query, options, json).await
        }
        Commands::History { limit } => {
            let storage = open_storage(&config).await?;
            cli::execute_history(&storage, limit).await
        }
        Commands::Show { session_id } => {
            let storage = open_storage(&config).await?;
            cli::execute_show(&storage, &session_id).await
        }
    };

    report(outcome)
}

async fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            Ok(s)
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            Err(e.into())
        }
    }
}

async fn build_orchestrator(config: &Config) -> anyhow::Result<ResearchOrchestrator> {
    let stages = match LlmResearchStages::from_config(config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!(error = %e, "Failed to initialize research stages");
            return Err(e.into());
        }
    };

    let mut orchestrator = ResearchOrchestrator::new(stages.clone(), stages)
        .with_target_source_count(config.research.target_source_count);

    if config.database.persist_runs {
        match open_storage(config).await {
            Ok(storage) => {
                let storage: Arc<dyn Storage> = Arc::new(storage);
                orchestrator = orchestrator.with_storage(storage);
            }
            Err(e) => warn!(error = %e, "Run persistence disabled"),
        }
    }

    Ok(orchestrator)
}

fn report(outcome: CliResult) -> anyhow::Result<()> {
    if outcome.exit_code == 0 {
        println!("{}", outcome.message);
        Ok(())
    } else {
        eprintln!("{}", outcome.message);
        std::process::exit(outcome.exit_code);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
