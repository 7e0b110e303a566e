use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;
use crate::research::RetryPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub research: ResearchConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
}

/// Primary and fallback LLM backend configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub fallback_api_key: Option<String>,
    pub fallback_base_url: String,
    pub fallback_model: String,
}

/// Primary and fallback search provider configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub fallback_api_key: Option<String>,
    pub fallback_base_url: String,
    pub max_results: usize,
    pub timeout_ms: u64,
}

/// Research pipeline defaults
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Default cap on sources kept after de-duplication.
    pub max_sources: usize,
    /// Source count at which the adequacy signal saturates.
    pub target_source_count: usize,
    /// Whether the verification stage runs by default.
    pub verify_claims: bool,
    /// Retry policy applied around individual search calls.
    pub search_retry: RetryPolicy,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub persist_runs: bool,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secret(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => match v.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let llm = LlmConfig {
            api_key: env_secret("OPENAI_API_KEY"),
            base_url: env_string("OPENAI_BASE_URL", "https://api.openai.com"),
            model: env_string("LLM_MODEL", "gpt-4"),
            temperature: env_or("LLM_TEMPERATURE", 0.7),
            max_tokens: env_or("LLM_MAX_TOKENS", 4096),
            fallback_api_key: env_secret("ANTHROPIC_API_KEY"),
            fallback_base_url: env_string("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
            fallback_model: env_string("FALLBACK_MODEL", "claude-3-sonnet-20240229"),
        };

        if llm.api_key.is_none() && llm.fallback_api_key.is_none() {
            return Err(AppError::Config {
                message: "OPENAI_API_KEY or ANTHROPIC_API_KEY is required".to_string(),
            });
        }

        let search = SearchConfig {
            api_key: env_secret("TAVILY_API_KEY"),
            base_url: env_string("TAVILY_BASE_URL", "https://api.tavily.com"),
            fallback_api_key: env_secret("SERPER_API_KEY"),
            fallback_base_url: env_string("SERPER_BASE_URL", "https://google.serper.dev"),
            max_results: env_or("SEARCH_MAX_RESULTS", 10),
            timeout_ms: env_or("SEARCH_TIMEOUT_MS", 30000),
        };

        let research = ResearchConfig {
            max_sources: env_or("MAX_SOURCES", 10),
            target_source_count: env_or::<usize>("TARGET_SOURCE_COUNT", 10).max(1),
            verify_claims: env_bool("VERIFY_CLAIMS", true),
            search_retry: RetryPolicy {
                max_attempts: env_or::<u32>("SEARCH_RETRY_ATTEMPTS", 3).max(1),
                initial_delay_ms: env_or("SEARCH_RETRY_DELAY_MS", 1000),
                backoff_factor: env_or("SEARCH_RETRY_BACKOFF", 2.0),
            },
        };

        let database = DatabaseConfig {
            path: PathBuf::from(env_string("DATABASE_PATH", "./data/research.db")),
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 5),
            persist_runs: env_bool("PERSIST_RUNS", true),
        };

        let logging = LoggingConfig {
            level: env_string("LOG_LEVEL", "info"),
            format: match env_string("LOG_FORMAT", "pretty").to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            max_retries: env_or("MAX_RETRIES", 3),
            retry_delay_ms: env_or("RETRY_DELAY_MS", 1000),
        };

        Ok(Config {
            llm,
            search,
            research,
            database,
            logging,
            request,
        })
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_sources: 10,
            target_source_count: 10,
            verify_claims: true,
            search_retry: RetryPolicy::default(),
        }
    }
}

impl RequestConfig {
    /// Retry policy equivalent to this request configuration.
    ///
    /// `max_retries` counts retries, so the policy allows one more attempt.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries + 1,
            initial_delay_ms: self.retry_delay_ms,
            backoff_factor: 2.0,
        }
    }
}
