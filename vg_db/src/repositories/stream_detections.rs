//! ABOUTME: Live detection repository for simulator and API-created events
//! ABOUTME: Bounding boxes are stored as JSON text alongside the label

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, SqlitePool};
use vg_core::{time::now_iso8601, Error, Id, Result};

/// Bounding box for a live detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Live detection entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StreamDetection {
    pub id: String,
    pub stream_id: String,
    pub label: String,
    pub confidence: f64,
    pub bbox: String, // JSON
    pub created_at: String,
}

impl StreamDetection {
    /// Parse the stored bounding box JSON
    pub fn bounding_box(&self) -> Result<BoundingBox> {
        serde_json::from_str(&self.bbox)
            .map_err(|e| Error::Database(format!("Invalid bbox JSON: {}", e)))
    }
}

/// Request to create a live detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStreamDetectionRequest {
    pub stream_id: String,
    pub label: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

pub struct StreamDetectionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> StreamDetectionRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, request: CreateStreamDetectionRequest) -> Result<StreamDetection> {
        let id = Id::new().to_string();
        let now = now_iso8601();
        let bbox = serde_json::to_string(&request.bbox)
            .map_err(|e| Error::Database(format!("Failed to encode bbox: {}", e)))?;

        let detection = sqlx::query_as::<_, StreamDetection>(
            r#"
            INSERT INTO stream_detections (id, stream_id, label, confidence, bbox, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, stream_id, label, confidence, bbox, created_at
            "#,
        )
        .bind(&id)
        .bind(&request.stream_id)
        .bind(&request.label)
        .bind(request.confidence)
        .bind(&bbox)
        .bind(&now)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create detection: {}", e)))?;

        Ok(detection)
    }

    /// List live detections newest-first, optionally filtered by stream
    pub async fn list(&self, stream_id: Option<&str>, limit: i64) -> Result<Vec<StreamDetection>> {
        let detections = match stream_id {
            Some(stream_id) => {
                sqlx::query_as::<_, StreamDetection>(
                    r#"
                    SELECT id, stream_id, label, confidence, bbox, created_at
                    FROM stream_detections WHERE stream_id = ?1
                    ORDER BY created_at DESC LIMIT ?2
                    "#,
                )
                .bind(stream_id)
                .bind(limit)
                .fetch_all(self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, StreamDetection>(
                    r#"
                    SELECT id, stream_id, label, confidence, bbox, created_at
                    FROM stream_detections
                    ORDER BY created_at DESC LIMIT ?1
                    "#,
                )
                .bind(limit)
                .fetch_all(self.pool)
                .await
            }
        }
        .map_err(|e| Error::Database(format!("Failed to list detections: {}", e)))?;

        Ok(detections)
    }

    /// Count live detections for one stream
    pub async fn count_for_stream(&self, stream_id: &str) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM stream_detections WHERE stream_id = ?1",
        )
        .bind(stream_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to count detections: {}", e)))?;

        Ok(row.get("count"))
    }
}
