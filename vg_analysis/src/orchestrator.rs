//! ABOUTME: Sequences the four analysis stages and persists one atomic run
//! ABOUTME: Serializes concurrent runs per video id to keep runs from interleaving

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{info, warn};
use vg_core::{Error, Result};
use vg_db::{insert_analysis_run, AnalysisRun, VideoRepository};

use crate::stages::{AlertScore, FrameDetections, Stages};

/// Raw outputs of one analysis run, returned to the caller after the
/// records have been committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub video_id: String,
    pub object_detection: Vec<FrameDetections>,
    pub classification: Vec<String>,
    pub alerts: Vec<AlertScore>,
    pub summary: String,
}

/// Runs the analysis pipeline for one video at a time per video id
pub struct Orchestrator {
    pool: SqlitePool,
    stages: Stages,
    // per-video-id locks; entries are created on first use and kept for
    // the process lifetime (video id cardinality is small)
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(pool: SqlitePool, stages: Stages) -> Self {
        Self {
            pool,
            stages,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, video_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(video_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run all four stages against `video_url` and persist the results for
    /// `video_id` as a single transaction.
    ///
    /// Fails with `Error::NotFound` for an unregistered video id and
    /// `Error::Analysis` when persistence fails. A detection-stage source
    /// failure degrades to an empty detection set rather than failing the
    /// run.
    pub async fn analyze(&self, video_id: &str, video_url: &str) -> Result<AnalysisOutcome> {
        VideoRepository::new(&self.pool)
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Video not found: {}", video_id)))?;

        let lock = self.lock_for(video_id).await;
        let _guard = lock.lock().await;

        info!(video_id, video_url, "Starting analysis run");

        let object_detection = match self.stages.detect(video_url).await {
            Ok(detections) => detections,
            Err(Error::Source(e)) => {
                warn!(video_id, error = %e, "Detection source unavailable, recording no detections");
                Vec::new()
            }
            Err(e) => {
                return Err(Error::Analysis(format!(
                    "Detection stage failed for {}: {}",
                    video_id, e
                )))
            }
        };

        let classification = self.stages.classify(video_url).await;
        let alerts = self.stages.alerts(video_url).await;
        let summary = self.stages.summarize(video_url).await;

        let run = AnalysisRun {
            video_id: video_id.to_string(),
            detections: object_detection
                .iter()
                .map(|d| (d.frame_index, d.objects.clone()))
                .collect(),
            classification: classification.clone(),
            alerts: alerts
                .iter()
                .map(|a| (a.category.clone(), a.confidence))
                .collect(),
            summary: summary.clone(),
        };

        insert_analysis_run(&self.pool, &run)
            .await
            .map_err(|e| Error::Analysis(format!("Failed to persist analysis run: {}", e)))?;

        info!(
            video_id,
            detections = object_detection.len(),
            alerts = alerts.len(),
            "Analysis run committed"
        );

        Ok(AnalysisOutcome {
            video_id: video_id.to_string(),
            object_detection,
            classification,
            alerts,
            summary,
        })
    }
}
