//! ABOUTME: Transactional writer for one complete analysis run
//! ABOUTME: All rows for a run commit together or not at all

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use vg_core::{time::now_iso8601, Error, Id, Result};

/// All records produced by one analysis run of one video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub video_id: String,
    /// (frame_index, object labels), ascending by frame_index
    pub detections: Vec<(i64, Vec<String>)>,
    /// Classification labels (possibly empty, still recorded)
    pub classification: Vec<String>,
    /// (hazard category, confidence in [0, 1])
    pub alerts: Vec<(String, f64)>,
    /// Summary text (fallback string when generation failed)
    pub summary: String,
}

/// Persist an analysis run as a single transaction.
///
/// A failure on any insert rolls back every row staged for this run.
pub async fn insert_analysis_run(pool: &SqlitePool, run: &AnalysisRun) -> Result<()> {
    let now = now_iso8601();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| Error::Database(format!("Failed to begin analysis transaction: {}", e)))?;

    for (frame_index, objects) in &run.detections {
        let objects_json = serde_json::to_string(objects)
            .map_err(|e| Error::Database(format!("Failed to encode objects: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO video_detections (id, video_id, frame_index, objects, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Id::new().to_string())
        .bind(&run.video_id)
        .bind(frame_index)
        .bind(&objects_json)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to insert detection: {}", e)))?;
    }

    let labels_json = serde_json::to_string(&run.classification)
        .map_err(|e| Error::Database(format!("Failed to encode labels: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO video_classifications (id, video_id, labels, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(Id::new().to_string())
    .bind(&run.video_id)
    .bind(&labels_json)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::Database(format!("Failed to insert classification: {}", e)))?;

    for (category, confidence) in &run.alerts {
        sqlx::query(
            r#"
            INSERT INTO video_alerts (id, video_id, category, confidence, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Id::new().to_string())
        .bind(&run.video_id)
        .bind(category)
        .bind(confidence)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to insert alert: {}", e)))?;
    }

    sqlx::query(
        r#"
        INSERT INTO video_summaries (id, video_id, summary_text, created_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(Id::new().to_string())
    .bind(&run.video_id)
    .bind(&run.summary)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| Error::Database(format!("Failed to insert summary: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| Error::Database(format!("Failed to commit analysis run: {}", e)))?;

    debug!(
        video_id = %run.video_id,
        detections = run.detections.len(),
        alerts = run.alerts.len(),
        "Analysis run persisted"
    );

    Ok(())
}
