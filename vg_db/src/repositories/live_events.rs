//! ABOUTME: Transactional writer for one simulator tick
//! ABOUTME: Writes one detection plus its correlated alert atomically

use sqlx::SqlitePool;
use vg_core::{time::now_iso8601, Error, Id, Result};

use super::{
    stream_alerts::CreateStreamAlertRequest, stream_detections::CreateStreamDetectionRequest,
};

/// Write one live detection and its correlated alert in one transaction
pub async fn insert_live_event(
    pool: &SqlitePool,
    detection: CreateStreamDetectionRequest,
    alert: CreateStreamAlertRequest,
) -> Result<()> {
    let now = now_iso8601();
    let bbox = serde_json::to_string(&detection.bbox)
        .map_err(|e| Error::Database(format!("Failed to encode bbox: {}", e)))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::Database(format!("Failed to begin tick transaction: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO stream_detections (id, stream_id, label, confidence, bbox, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(Id::new().to_string())
    .bind(&detection.stream_id)
    .bind(&detection.label)
    .bind(detection.confidence)
    .bind(&bbox)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::Database(format!("Failed to insert live detection: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO stream_alerts (id, stream_id, message, level, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(Id::new().to_string())
    .bind(&alert.stream_id)
    .bind(&alert.message)
    .bind(&alert.level)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::Database(format!("Failed to insert live alert: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| Error::Database(format!("Failed to commit live event: {}", e)))?;

    Ok(())
}
