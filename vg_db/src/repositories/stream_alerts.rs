//! ABOUTME: Live alert repository for simulator and API-created alerts
//! ABOUTME: Alerts carry a free-text message and a low/medium/high level

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use vg_core::{time::now_iso8601, Error, Id, Result};

/// Live alert entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StreamAlert {
    pub id: String,
    pub stream_id: String,
    pub message: String,
    pub level: String,
    pub created_at: String,
}

/// Request to create a live alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStreamAlertRequest {
    pub stream_id: String,
    pub message: String,
    pub level: String,
}

pub struct StreamAlertRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StreamAlertRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateStreamAlertRequest) -> Result<StreamAlert> {
        let id = Id::new().to_string();
        let now = now_iso8601();

        let alert = sqlx::query_as::<_, StreamAlert>(
            r#"
            INSERT INTO stream_alerts (id, stream_id, message, level, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, stream_id, message, level, created_at
            "#,
        )
        .bind(&id)
        .bind(&request.stream_id)
        .bind(&request.message)
        .bind(&request.level)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create alert: {}", e)))?;

        Ok(alert)
    }

    /// List live alerts newest-first, optionally filtered by stream
    pub async fn list(&self, stream_id: Option<&str>, limit: i64) -> Result<Vec<StreamAlert>> {
        let alerts = match stream_id {
            Some(stream_id) => {
                sqlx::query_as::<_, StreamAlert>(
                    r#"
                    SELECT id, stream_id, message, level, created_at
                    FROM stream_alerts WHERE stream_id = ?1
                    ORDER BY created_at DESC LIMIT ?2
                    "#,
                )
                .bind(stream_id)
                .bind(limit)
                .fetch_all(self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, StreamAlert>(
                    r#"
                    SELECT id, stream_id, message, level, created_at
                    FROM stream_alerts
                    ORDER BY created_at DESC LIMIT ?1
                    "#,
                )
                .bind(limit)
                .fetch_all(self.pool)
                .await
            }
        }
        .map_err(|e| Error::Database(format!("Failed to list alerts: {}", e)))?;

        Ok(alerts)
    }

    /// Latest alert for one stream, if any
    pub async fn latest_for_stream(&self, stream_id: &str) -> Result<Option<StreamAlert>> {
        let alert = sqlx::query_as::<_, StreamAlert>(
            r#"
            SELECT id, stream_id, message, level, created_at
            FROM stream_alerts WHERE stream_id = ?1
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(stream_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to find latest alert: {}", e)))?;

        Ok(alert)
    }
}
