//! ABOUTME: Per-frame detection records for analyzed videos
//! ABOUTME: frame_index is the sampling ordinal within one analysis run

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use vg_core::{Error, Result};

/// Frame detection entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoDetection {
    pub id: String,
    pub video_id: String,
    pub frame_index: i64,
    pub objects: String, // JSON array of labels
    pub created_at: String,
}

impl VideoDetection {
    /// Parse the stored label array; malformed rows read as empty
    pub fn object_labels(&self) -> Vec<String> {
        serde_json::from_str(&self.objects).unwrap_or_default()
    }
}

pub struct VideoDetectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VideoDetectionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All detection rows for one video, in frame order
    pub async fn list_for_video(&self, video_id: &str) -> Result<Vec<VideoDetection>> {
        let detections = sqlx::query_as::<_, VideoDetection>(
            r#"
            SELECT id, video_id, frame_index, objects, created_at
            FROM video_detections WHERE video_id = ?1
            ORDER BY frame_index ASC
            "#,
        )
        .bind(video_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list video detections: {}", e)))?;

        Ok(detections)
    }
}
