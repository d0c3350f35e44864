//! ABOUTME: Database layer with SQLite, migrations, and repositories
//! ABOUTME: Handles all data persistence and database operations

use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Row, Sqlite, SqlitePool,
};
use tracing::{debug, info, instrument};
use vg_core::{Error, Result};

/// Allowed table names for statistics queries
/// This is a security measure to prevent SQL injection via dynamic table names
const ALLOWED_TABLES: &[&str] = &[
    "videos",
    "streams",
    "stream_detections",
    "stream_alerts",
    "video_detections",
    "video_classifications",
    "video_alerts",
    "video_summaries",
];

/// Validates that a table name contains only safe SQL identifier characters
fn is_safe_sql_identifier(table: &str) -> bool {
    if table.is_empty() {
        return false;
    }

    let mut chars = table.chars();

    // First character must be a letter or underscore (SQL identifier rules)
    // Safe to unwrap because we already checked the string is not empty
    let first = chars.next().unwrap();
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Database connection pool and operations
#[derive(Debug, Clone)]
pub struct Db {
    pool: SqlitePool,
}

/// Pool tuning knobs, normally sourced from the database config section
#[derive(Debug, Clone)]
pub struct DbOptions {
    pub pool_size: u32,
    pub sqlite_wal: bool,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            pool_size: 10,
            sqlite_wal: true,
        }
    }
}

impl Db {
    /// Create a new database connection with migrations and default pool options
    pub async fn new(db_path: &str) -> Result<Self> {
        Self::with_options(db_path, DbOptions::default()).await
    }

    /// Create a new database connection with explicit pool options
    #[instrument(skip(db_path, options))]
    pub async fn with_options(db_path: &str, options: DbOptions) -> Result<Self> {
        info!("Initializing database at: {}", db_path);

        let database_url = format!("sqlite://{}", db_path);
        if !Sqlite::database_exists(&database_url)
            .await
            .unwrap_or(false)
        {
            info!("Creating database: {}", database_url);
            Sqlite::create_database(&database_url)
                .await
                .map_err(|e| Error::Database(format!("Failed to create database: {}", e)))?;
        }

        // tuned pragmas; foreign_keys=ON makes the plain REFERENCES
        // constraints on the record tables effective
        let journal_mode = if options.sqlite_wal {
            SqliteJournalMode::Wal
        } else {
            SqliteJournalMode::Delete
        };
        let connect_options = SqliteConnectOptions::new()
            .filename(db_path)
            .journal_mode(journal_mode)
            .create_if_missing(true)
            .pragma("foreign_keys", "ON")
            .pragma("synchronous", "NORMAL")
            .pragma("cache_size", "10000")
            .pragma("temp_store", "memory")
            .pragma("busy_timeout", "30000");

        let pool = SqlitePoolOptions::new()
            .max_connections(options.pool_size)
            .min_connections(1)
            .connect_with(connect_options)
            .await
            .map_err(|e| Error::Database(format!("Failed to create connection pool: {}", e)))?;

        let db = Self { pool };

        db.migrate().await?;

        info!("Database initialized successfully");
        Ok(db)
    }

    /// Run database migrations
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Migration failed: {}", e)))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a Db instance from an existing pool (for testing/reuse)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Check database health
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<()> {
        debug!("Performing database health check");

        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Health check failed: {}", e)))?;

        debug!("Database health check passed");
        Ok(())
    }

    /// Get per-table row counts
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<DatabaseStats> {
        debug!("Gathering database statistics");

        let mut table_counts = std::collections::HashMap::new();

        for &table in ALLOWED_TABLES {
            if !is_safe_sql_identifier(table) {
                return Err(Error::Database(format!(
                    "ALLOWED_TABLES contains invalid SQL identifier: '{}'",
                    table
                )));
            }

            // SQLx doesn't support parameterized table names; the name comes
            // from the validated allow-list above
            let query = format!("SELECT COUNT(*) as count FROM {}", table);
            let row = sqlx::query(&query)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(format!("Failed to get count for {}: {}", table, e))
                })?;

            let count: i64 = row.get("count");
            table_counts.insert(table.to_string(), count);
        }

        Ok(DatabaseStats { table_counts })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DatabaseStats {
    pub table_counts: std::collections::HashMap<String, i64>,
}

pub mod repositories;

pub use repositories::{
    analysis_runs::{insert_analysis_run, AnalysisRun},
    live_events::insert_live_event,
    stream_alerts::{CreateStreamAlertRequest, StreamAlert, StreamAlertRepository},
    stream_detections::{
        BoundingBox, CreateStreamDetectionRequest, StreamDetection, StreamDetectionRepository,
    },
    streams::{Stream, StreamRepository, UpsertStreamRequest},
    video_alerts::{VideoAlert, VideoAlertRepository},
    video_classifications::{VideoClassification, VideoClassificationRepository},
    video_detections::{VideoDetection, VideoDetectionRepository},
    video_summaries::{VideoSummary, VideoSummaryRepository},
    videos::{CreateVideoRequest, Video, VideoRepository},
};
