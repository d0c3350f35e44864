//! ABOUTME: Hazard alert records for analyzed videos
//! ABOUTME: Confidence values are uniformly on the [0, 1] scale

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use vg_core::{Error, Result};

/// Video alert entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VideoAlert {
    pub id: String,
    pub video_id: String,
    pub category: String,
    pub confidence: f64,
    pub created_at: String,
}

pub struct VideoAlertRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> VideoAlertRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All alerts recorded for one video
    pub async fn list_for_video(&self, video_id: &str) -> Result<Vec<VideoAlert>> {
        let alerts = sqlx::query_as::<_, VideoAlert>(
            r#"
            SELECT id, video_id, category, confidence, created_at
            FROM video_alerts WHERE video_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(video_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to list video alerts: {}", e)))?;

        Ok(alerts)
    }
}
