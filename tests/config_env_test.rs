//! Config environment variable tests
//!
//! These tests verify that Config::from_env() reads and applies environment
//! variable overrides and falls back to defaults for unparseable values.
//!
//! Tests use #[serial] to prevent race conditions with shared env vars.

use deep_research::config::{Config, LogFormat};
use serial_test::serial;
use std::env;

const TOUCHED: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "OPENAI_BASE_URL",
    "LLM_MODEL",
    "LLM_TEMPERATURE",
    "TAVILY_API_KEY",
    "SERPER_API_KEY",
    "SEARCH_MAX_RESULTS",
    "MAX_SOURCES",
    "TARGET_SOURCE_COUNT",
    "VERIFY_CLAIMS",
    "SEARCH_RETRY_ATTEMPTS",
    "SEARCH_RETRY_DELAY_MS",
    "DATABASE_PATH",
    "DATABASE_MAX_CONNECTIONS",
    "PERSIST_RUNS",
    "LOG_FORMAT",
    "LOG_LEVEL",
    "MAX_RETRIES",
];

/// Clear every variable these tests touch, then set a primary key.
fn reset_env() {
    for key in TOUCHED {
        env::remove_var(key);
    }
    env::set_var("OPENAI_API_KEY", "sk-test");
}

#[test]
#[serial]
fn test_config_defaults() {
    reset_env();

    let config = Config::from_env().unwrap();
    assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.research.max_sources, 10);
    assert_eq!(config.research.target_source_count, 10);
    assert!(config.research.verify_claims);
    assert_eq!(config.research.search_retry.max_attempts, 3);
    assert_eq!(config.request.max_retries, 3);
    assert!(config.database.persist_runs);
}

#[test]
#[serial]
fn test_config_requires_an_llm_key() {
    reset_env();
    env::remove_var("OPENAI_API_KEY");

    let result = Config::from_env();
    // A .env file on the search path may still supply a key.
    if env::var("OPENAI_API_KEY").is_err() && env::var("ANTHROPIC_API_KEY").is_err() {
        assert!(result.is_err(), "missing LLM keys should be a config error");
    }

    env::remove_var("OPENAI_API_KEY");
    env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
    let config = Config::from_env().unwrap();
    assert_eq!(config.llm.fallback_api_key.as_deref(), Some("sk-ant-test"));

    reset_env();
}

#[test]
#[serial]
fn test_config_blank_key_counts_as_missing() {
    reset_env();
    env::set_var("TAVILY_API_KEY", "   ");

    let config = Config::from_env().unwrap();
    assert!(config.search.api_key.is_none());
}

#[test]
#[serial]
fn test_config_custom_llm_settings() {
    reset_env();
    env::set_var("OPENAI_BASE_URL", "https://llm.internal");
    env::set_var("LLM_MODEL", "gpt-4o-mini");
    env::set_var("LLM_TEMPERATURE", "0.2");

    let config = Config::from_env().unwrap();
    assert_eq!(config.llm.base_url, "https://llm.internal");
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.temperature, 0.2);

    reset_env();
}

#[test]
#[serial]
fn test_config_custom_research_settings() {
    reset_env();
    env::set_var("MAX_SOURCES", "25");
    env::set_var("VERIFY_CLAIMS", "false");
    env::set_var("SEARCH_RETRY_ATTEMPTS", "5");
    env::set_var("SEARCH_RETRY_DELAY_MS", "10");

    let config = Config::from_env().unwrap();
    assert_eq!(config.research.max_sources, 25);
    assert!(!config.research.verify_claims);
    assert_eq!(config.research.search_retry.max_attempts, 5);
    assert_eq!(config.research.search_retry.initial_delay_ms, 10);

    reset_env();
}

#[test]
#[serial]
fn test_config_zero_counts_are_raised_to_one() {
    reset_env();
    env::set_var("TARGET_SOURCE_COUNT", "0");
    env::set_var("SEARCH_RETRY_ATTEMPTS", "0");

    let config = Config::from_env().unwrap();
    assert_eq!(config.research.target_source_count, 1);
    assert_eq!(config.research.search_retry.max_attempts, 1);

    reset_env();
}

#[test]
#[serial]
fn test_config_invalid_numbers_fall_back_to_defaults() {
    reset_env();
    env::set_var("MAX_SOURCES", "lots");
    env::set_var("DATABASE_MAX_CONNECTIONS", "-3");
    env::set_var("MAX_RETRIES", "three");

    let config = Config::from_env().unwrap();
    assert_eq!(config.research.max_sources, 10);
    assert_eq!(config.database.max_connections, 5);
    assert_eq!(config.request.max_retries, 3);

    reset_env();
}

#[test]
#[serial]
fn test_config_custom_database() {
    reset_env();
    env::set_var("DATABASE_PATH", "/custom/research.db");
    env::set_var("DATABASE_MAX_CONNECTIONS", "10");
    env::set_var("PERSIST_RUNS", "no");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.path.to_str().unwrap(), "/custom/research.db");
    assert_eq!(config.database.max_connections, 10);
    assert!(!config.database.persist_runs);

    reset_env();
}

#[test]
#[serial]
fn test_config_json_log_format() {
    reset_env();
    env::set_var("LOG_FORMAT", "JSON");
    env::set_var("LOG_LEVEL", "debug");

    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "debug");

    env::set_var("LOG_FORMAT", "anything-else");
    let config = Config::from_env().unwrap();
    assert_eq!(config.logging.format, LogFormat::Pretty);

    reset_env();
}
