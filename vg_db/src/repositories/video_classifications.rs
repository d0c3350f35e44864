//! ABOUTME: Whole-video classification records
//! ABOUTME: One row per analysis run; callers read the latest

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use vg_core::{Error, Result};

/// Classification entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoClassification {
    pub id: String,
    pub video_id: String,
    pub labels: String, // JSON array of labels
    pub created_at: String,
}

impl VideoClassification {
    /// Parse the stored label array; malformed rows read as empty
    pub fn label_list(&self) -> Vec<String> {
        serde_json::from_str(&self.labels).unwrap_or_default()
    }
}

pub struct VideoClassificationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VideoClassificationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Latest classification for one video, if any
    pub async fn latest_for_video(&self, video_id: &str) -> Result<Option<VideoClassification>> {
        let classification = sqlx::query_as::<_, VideoClassification>(
            r#"
            SELECT id, video_id, labels, created_at
            FROM video_classifications WHERE video_id = ?1
            ORDER BY created_at DESC, rowid DESC LIMIT 1
            "#,
        )
        .bind(video_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to find classification: {}", e)))?;

        Ok(classification)
    }
}
