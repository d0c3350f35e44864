//! ABOUTME: Video reference repository for uploaded video metadata
//! ABOUTME: Deletion cascades through all analysis record tables in order

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::info;
use vg_core::{time::now_iso8601, Error, Id, Result};

/// Video reference entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: String,
    pub filename: String,
    pub storage_url: String,
    pub uploaded_at: String,
    pub created_at: String,
}

/// Request to register uploaded video metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideoRequest {
    pub filename: String,
    pub storage_url: String,
    pub uploaded_at: String,
}

pub struct VideoRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VideoRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateVideoRequest) -> Result<Video> {
        let id = Id::new().to_string();
        let now = now_iso8601();

        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (id, filename, storage_url, uploaded_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, filename, storage_url, uploaded_at, created_at
            "#,
        )
        .bind(&id)
        .bind(&request.filename)
        .bind(&request.storage_url)
        .bind(&request.uploaded_at)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create video: {}", e)))?;

        Ok(video)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            "SELECT id, filename, storage_url, uploaded_at, created_at FROM videos WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to find video: {}", e)))?;

        Ok(video)
    }

    /// List videos, newest upload first
    pub async fn list(&self) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT id, filename, storage_url, uploaded_at, created_at
            FROM videos ORDER BY uploaded_at DESC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list videos: {}", e)))?;

        Ok(videos)
    }

    /// Delete a video and all of its analysis records in one transaction.
    ///
    /// Record tables are cleared before the video row so the plain
    /// REFERENCES constraints never see a dangling video id. Returns false
    /// if the video does not exist.
    pub async fn delete_cascade(&self, id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        let exists = sqlx::query("SELECT id FROM videos WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to find video: {}", e)))?
            .is_some();

        if !exists {
            return Ok(false);
        }

        for table in [
            "video_alerts",
            "video_classifications",
            "video_detections",
            "video_summaries",
        ] {
            let query = format!("DELETE FROM {} WHERE video_id = ?1", table);
            sqlx::query(&query)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to clear {}: {}", table, e)))?;
        }

        sqlx::query("DELETE FROM videos WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete video: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit video deletion: {}", e)))?;

        info!(video_id = %id, "Video and analysis records deleted");
        Ok(true)
    }
}
