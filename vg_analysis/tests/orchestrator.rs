//! ABOUTME: Integration tests for the analysis orchestrator and summary view
//! ABOUTME: Runs the full pipeline against in-memory sources and a throwaway database

use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use vg_ai::{HazardDetector, HazardScore, ModelRegistry};
use vg_analysis::{build_summary_view, Orchestrator, Stages, SUMMARY_FALLBACK};
use vg_config::AnalysisConfig;
use vg_core::{Error, Result};
use vg_db::{CreateVideoRequest, Db, VideoRepository};
use vg_media::memory_source::MemoryOpener;
use vg_media::{Frame, MemorySource};

const VIDEO_URL: &str = "mem://clip.mp4";

async fn create_test_db(temp_dir: &TempDir) -> Db {
    let db_path = temp_dir.path().join("test.db");
    Db::new(&db_path.to_string_lossy())
        .await
        .expect("Failed to create test database")
}

async fn seed_video(db: &Db) -> String {
    VideoRepository::new(db.pool())
        .create(CreateVideoRequest {
            filename: "clip.mp4".to_string(),
            storage_url: VIDEO_URL.to_string(),
            uploaded_at: "2024-06-01T12:00:00Z".to_string(),
        })
        .await
        .expect("Failed to seed video")
        .id
}

fn orchestrator_with(db: &Db, registry: ModelRegistry) -> Orchestrator {
    let opener = MemoryOpener::new().with_source(VIDEO_URL, MemorySource::synthetic(100));
    let stages = Stages::new(Arc::new(opener), registry, AnalysisConfig::default());
    Orchestrator::new(db.pool().clone(), stages)
}

struct FailingHazards;

#[async_trait]
impl HazardDetector for FailingHazards {
    async fn detect_hazards(&self, _frames: &[Frame]) -> Result<Vec<HazardScore>> {
        Err(Error::External("hazard model unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_analyze_persists_all_record_types() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;
    let orchestrator = orchestrator_with(&db, ModelRegistry::stub());

    let outcome = orchestrator.analyze(&video_id, VIDEO_URL).await.unwrap();

    // 100 frames at stride 30 -> 4 sampled frames with ordinals 0..=3
    assert_eq!(outcome.object_detection.len(), 4);
    assert_eq!(outcome.classification.len(), 1);
    assert_eq!(outcome.alerts.len(), 2);
    assert_ne!(outcome.summary, SUMMARY_FALLBACK);

    let view = build_summary_view(db.pool(), &video_id)
        .await
        .unwrap()
        .expect("summary view should exist after a run");
    assert_eq!(view.total_frames, 4);
    assert_eq!(view.classification, outcome.classification);
    assert_eq!(view.alerts.len(), 2);
    assert_eq!(view.summary_text.as_deref(), Some(outcome.summary.as_str()));
}

#[tokio::test]
async fn test_analyze_unknown_video_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let orchestrator = orchestrator_with(&db, ModelRegistry::stub());

    let err = orchestrator
        .analyze("does-not-exist", VIDEO_URL)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // nothing was persisted
    let view = build_summary_view(db.pool(), "does-not-exist").await.unwrap();
    assert!(view.is_none());
}

#[tokio::test]
async fn test_alert_stage_failure_does_not_fail_the_run() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;

    let mut registry = ModelRegistry::stub();
    registry.hazards = Arc::new(FailingHazards);
    let orchestrator = orchestrator_with(&db, registry);

    let outcome = orchestrator.analyze(&video_id, VIDEO_URL).await.unwrap();

    assert!(outcome.alerts.is_empty());
    assert_eq!(outcome.object_detection.len(), 4);
    assert_eq!(outcome.classification.len(), 1);

    let view = build_summary_view(db.pool(), &video_id)
        .await
        .unwrap()
        .expect("detections and summary still persisted");
    assert!(view.alerts.is_empty());
    assert!(view.summary_text.is_some());
}

#[tokio::test]
async fn test_unopenable_source_records_empty_detections() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;
    let orchestrator = orchestrator_with(&db, ModelRegistry::stub());

    let outcome = orchestrator
        .analyze(&video_id, "mem://missing.mp4")
        .await
        .unwrap();

    assert!(outcome.object_detection.is_empty());
    assert!(outcome.classification.is_empty());
    assert_eq!(outcome.summary, SUMMARY_FALLBACK);

    // no detection rows means the aggregate reports no summary
    let view = build_summary_view(db.pool(), &video_id).await.unwrap();
    assert!(view.is_none());
}

#[tokio::test]
async fn test_rerun_accumulates_only_committed_records() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;
    let orchestrator = orchestrator_with(&db, ModelRegistry::stub());

    orchestrator.analyze(&video_id, VIDEO_URL).await.unwrap();
    orchestrator.analyze(&video_id, VIDEO_URL).await.unwrap();

    let view = build_summary_view(db.pool(), &video_id)
        .await
        .unwrap()
        .unwrap();
    // same ordinals across both runs merge into the same distinct set
    assert_eq!(view.total_frames, 4);
    // every label count is doubled, never a partial run's worth
    assert!(view.object_counts.values().all(|count| count % 2 == 0));
}

#[tokio::test]
async fn test_delete_cascade_resets_the_aggregate() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;
    let orchestrator = orchestrator_with(&db, ModelRegistry::stub());

    orchestrator.analyze(&video_id, VIDEO_URL).await.unwrap();
    assert!(build_summary_view(db.pool(), &video_id)
        .await
        .unwrap()
        .is_some());

    let deleted = VideoRepository::new(db.pool())
        .delete_cascade(&video_id)
        .await
        .unwrap();
    assert!(deleted);

    let view = build_summary_view(db.pool(), &video_id).await.unwrap();
    assert!(view.is_none());
}

#[tokio::test]
async fn test_concurrent_runs_for_same_video_serialize() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;
    let orchestrator = Arc::new(orchestrator_with(&db, ModelRegistry::stub()));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let orchestrator = orchestrator.clone();
        let video_id = video_id.clone();
        handles.push(tokio::spawn(async move {
            orchestrator.analyze(&video_id, VIDEO_URL).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let view = build_summary_view(db.pool(), &video_id)
        .await
        .unwrap()
        .unwrap();
    // four full runs, each contributing a complete set of detections
    assert!(view.object_counts.values().all(|count| count % 4 == 0));
}
