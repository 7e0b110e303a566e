use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{RunRecord, RunStatus, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::research::{ResearchStage, VerificationStatus};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Create an in-memory database
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // Each connection to :memory: is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> StorageResult<String> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization {
        message: e.to_string(),
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_run(&self, record: &RunRecord) -> StorageResult<()> {
        let stages = to_json(&record.stages_completed)?;
        let result = to_json(&record.result)?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO research_runs
                (session_id, query, status, confidence, verification_status,
                 stages_completed, duration_secs, error, result, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.session_id)
        .bind(&record.query)
        .bind(record.status.to_string())
        .bind(record.confidence)
        .bind(record.verification_status.as_str())
        .bind(&stages)
        .bind(record.duration_secs)
        .bind(&record.error)
        .bind(&result)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(session_id = %record.session_id, status = %record.status, "Run saved");
        Ok(())
    }

    async fn get_run(&self, session_id: &str) -> StorageResult<Option<RunRecord>> {
        let row: Option<RunRow> = sqlx::query_as(
            r#"
            SELECT session_id, query, status, confidence, verification_status,
                   stages_completed, duration_secs, error, result, created_at
            FROM research_runs
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RunRecord::try_from).transpose()
    }

    async fn list_recent_runs(&self, limit: u32) -> StorageResult<Vec<RunRecord>> {
        let rows: Vec<RunRow> = sqlx::query_as(
            r#"
            SELECT session_id, query, status, confidence, verification_status,
                   stages_completed, duration_secs, error, result, created_at
            FROM research_runs
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RunRecord::try_from).collect()
    }

    async fn delete_run(&self, session_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM research_runs WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::RunNotFound {
                session_id: session_id.to_string(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Row types for SQLx
// ============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    session_id: String,
    query: String,
    status: String,
    confidence: f64,
    verification_status: String,
    stages_completed: String,
    duration_secs: f64,
    error: Option<String>,
    result: String,
    created_at: String,
}

impl TryFrom<RunRow> for RunRecord {
    type Error = StorageError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        use chrono::DateTime;

        let result = serde_json::from_str(&row.result).map_err(|e| StorageError::Serialization {
            message: format!("Corrupt result for run {}: {}", row.session_id, e),
        })?;

        let stages_completed: Vec<ResearchStage> = serde_json::from_str(&row.stages_completed)
            .unwrap_or_else(|e| {
                warn!(session_id = %row.session_id, error = %e, "Unreadable stage list");
                Vec::new()
            });

        Ok(Self {
            status: row.status.parse().unwrap_or(RunStatus::Partial),
            verification_status: row
                .verification_status
                .parse()
                .unwrap_or(VerificationStatus::Failed),
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .unwrap_or_else(|_| chrono::Utc::now()),
            session_id: row.session_id,
            query: row.query,
            confidence: row.confidence,
            stages_completed,
            duration_secs: row.duration_secs,
            error: row.error,
            result,
        })
    }
}
