//! ABOUTME: Natural-language summary records for analyzed videos
//! ABOUTME: One row per analysis run; callers read the latest

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use vg_core::{Error, Result};

/// Video summary entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoSummary {
    pub id: String,
    pub video_id: String,
    pub summary_text: String,
    pub created_at: String,
}

pub struct VideoSummaryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VideoSummaryRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Latest summary for one video, if any
    pub async fn latest_for_video(&self, video_id: &str) -> Result<Option<VideoSummary>> {
        let summary = sqlx::query_as::<_, VideoSummary>(
            r#"
            SELECT id, video_id, summary_text, created_at
            FROM video_summaries WHERE video_id = ?1
            ORDER BY created_at DESC, rowid DESC LIMIT 1
            "#,
        )
        .bind(video_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to find summary: {}", e)))?;

        Ok(summary)
    }
}
