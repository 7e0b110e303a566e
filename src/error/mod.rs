use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Research error: {0}")]
    Research(#[from] ResearchError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Run not found: {session_id}")]
    RunNotFound { session_id: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// LLM backend errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} is not configured (missing API key)")]
    NotConfigured { provider: String },

    #[error("LLM unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Search provider errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{provider} is not configured (missing API key)")]
    NotConfigured { provider: String },

    #[error("Search unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures raised by a research stage or one of its collaborators.
///
/// The orchestrator treats every variant identically: the stage is marked
/// failed and the run switches to degraded output.
#[derive(Debug, Error)]
pub enum ResearchError {
    #[error("{what} not available")]
    MissingInput { what: String },

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{component} failed: {message}")]
    Collaborator { component: String, message: String },

    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ResearchError {
    /// Short, stable name of the error kind, used in error records.
    pub fn kind(&self) -> &'static str {
        match self {
            ResearchError::MissingInput { .. } => "MissingInput",
            ResearchError::InvalidInput { .. } => "InvalidInput",
            ResearchError::Collaborator { .. } => "CollaboratorError",
            ResearchError::Llm(_) => "LlmError",
            ResearchError::Search(_) => "SearchError",
            ResearchError::Internal { .. } => "InternalError",
        }
    }

    /// Shorthand for a collaborator failure.
    pub fn collaborator(component: impl Into<String>, message: impl Into<String>) -> Self {
        ResearchError::Collaborator {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing prerequisite.
    pub fn missing(what: impl Into<String>) -> Self {
        ResearchError::MissingInput { what: what.into() }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Result type alias for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Result type alias for stage operations
pub type StageResult<T> = Result<T, ResearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::RunNotFound {
            session_id: "session_1".to_string(),
        };
        assert_eq!(err.to_string(), "Run not found: session_1");

        let err = StorageError::Migration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: version mismatch");
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::NotConfigured {
            provider: "openai".to_string(),
        };
        assert_eq!(err.to_string(), "openai is not configured (missing API key)");

        let err = LlmError::Unavailable {
            message: "server down".to_string(),
            retries: 3,
        };
        assert_eq!(err.to_string(), "LLM unavailable: server down (retries: 3)");

        let err = LlmError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = LlmError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::NotConfigured {
            provider: "tavily".to_string(),
        };
        assert_eq!(err.to_string(), "tavily is not configured (missing API key)");

        let err = SearchError::InvalidResponse {
            message: "malformed JSON".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid response: malformed JSON");
    }

    #[test]
    fn test_research_error_display_and_kind() {
        let err = ResearchError::missing("Query analysis");
        assert_eq!(err.to_string(), "Query analysis not available");
        assert_eq!(err.kind(), "MissingInput");

        let err = ResearchError::collaborator("web_search", "provider exploded");
        assert_eq!(err.to_string(), "web_search failed: provider exploded");
        assert_eq!(err.kind(), "CollaboratorError");

        let err: ResearchError = LlmError::Timeout { timeout_ms: 10 }.into();
        assert_eq!(err.kind(), "LlmError");
        assert!(err.to_string().contains("Request timeout"));
    }

    #[test]
    fn test_error_conversions_to_app_error() {
        let app_err: AppError = StorageError::RunNotFound {
            session_id: "x".to_string(),
        }
        .into();
        assert!(matches!(app_err, AppError::Storage(_)));

        let app_err: AppError = LlmError::Timeout { timeout_ms: 1000 }.into();
        assert!(matches!(app_err, AppError::Llm(_)));

        let app_err: AppError = SearchError::Timeout { timeout_ms: 1000 }.into();
        assert!(matches!(app_err, AppError::Search(_)));

        let app_err: AppError = ResearchError::missing("sources").into();
        assert!(matches!(app_err, AppError::Research(_)));
    }
}
