//! ABOUTME: Handler tests over the full application factory
//! ABOUTME: Each test runs against its own throwaway database and storage dir

use std::sync::Arc;

use actix_web::test;
use serde_json::{json, Value};
use tempfile::TempDir;
use vg_ai::ModelRegistry;
use vg_analysis::{Orchestrator, Stages};
use vg_config::AnalysisConfig;
use vg_db::{Db, StreamRepository, UpsertStreamRequest};
use vg_media::memory_source::MemoryOpener;
use vg_media::MemorySource;
use vg_obs::Metrics;
use vg_storage::{StorageConfig, VideoStorage};

use crate::{create_app, AppState};

const VIDEO_URL: &str = "mem://clip.mp4";

async fn create_test_state(temp_dir: &TempDir) -> AppState {
    let db_path = temp_dir.path().join("test.db");
    let db = Db::new(&db_path.to_string_lossy())
        .await
        .expect("Failed to create test database");

    let opener = MemoryOpener::new().with_source(VIDEO_URL, MemorySource::synthetic(100));
    let stages = Stages::new(
        Arc::new(opener),
        ModelRegistry::stub(),
        AnalysisConfig::default(),
    );
    let orchestrator = Arc::new(Orchestrator::new(db.pool().clone(), stages));

    let storage = Arc::new(
        VideoStorage::new(StorageConfig {
            base_dir: Some(temp_dir.path().join("videos")),
            ..Default::default()
        })
        .expect("Failed to create test storage"),
    );

    AppState {
        db,
        orchestrator,
        storage,
        metrics: Arc::new(Metrics::new()),
    }
}

async fn seed_stream(state: &AppState, id: &str) {
    StreamRepository::new(state.db.pool())
        .upsert(UpsertStreamRequest {
            id: id.to_string(),
            name: "Main Entrance".to_string(),
            status: "active".to_string(),
            thumbnail: "/placeholder.svg".to_string(),
            uptime: "99.2%".to_string(),
        })
        .await
        .expect("Failed to seed stream");
}

async fn register_video(state: &AppState) -> String {
    vg_db::VideoRepository::new(state.db.pool())
        .create(vg_db::CreateVideoRequest {
            filename: "clip.mp4".to_string(),
            storage_url: VIDEO_URL.to_string(),
            uploaded_at: "2024-06-01T12:00:00Z".to_string(),
        })
        .await
        .expect("Failed to register video")
        .id
}

#[actix_web::test]
async fn test_root_liveness_message() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Video Management Backend is running");
}

#[actix_web::test]
async fn test_video_metadata_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::post()
        .uri("/videos/metadata")
        .set_json(json!({
            "filename": "clip.mp4",
            "storage_url": VIDEO_URL,
            "uploaded_at": "2024-06-01T12:00:00Z",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Metadata saved");
    let video_id = body["video"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri("/videos/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let videos = body.as_array().unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0]["id"], video_id.as_str());
    assert_eq!(videos[0]["filename"], "clip.mp4");
}

#[actix_web::test]
async fn test_video_metadata_validation() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::post()
        .uri("/videos/metadata")
        .set_json(json!({
            "filename": "",
            "storage_url": VIDEO_URL,
            "uploaded_at": "2024-06-01T12:00:00Z",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_delete_video_removes_everything() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let video_id = register_video(&state).await;
    let app = test::init_service(create_app(state)).await;

    // run an analysis so there are records to cascade through
    let req = test::TestRequest::post()
        .uri("/ai/analyze")
        .set_json(json!({"video_url": VIDEO_URL, "video_id": video_id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::delete()
        .uri(&format!("/videos/{}", video_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Video deleted successfully");

    // the aggregate now reports no summary
    let req = test::TestRequest::get()
        .uri(&format!("/ai/summary?video_id={}", video_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["summary"].is_null());

    // second delete is a 404
    let req = test::TestRequest::delete()
        .uri(&format!("/videos/{}", video_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_analyze_unknown_video_returns_404() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::post()
        .uri("/ai/analyze")
        .set_json(json!({"video_url": VIDEO_URL, "video_id": "no-such-video"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_analyze_returns_all_stage_outputs() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let video_id = register_video(&state).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::post()
        .uri("/ai/analyze")
        .set_json(json!({"video_url": VIDEO_URL, "video_id": video_id}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["object_detection"].as_array().unwrap().len(), 4);
    assert_eq!(body["classification"].as_array().unwrap().len(), 1);
    assert_eq!(body["alerts"].as_array().unwrap().len(), 2);
    assert!(body["summary"].is_string());
}

#[actix_web::test]
async fn test_summary_aggregates_after_analysis() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let video_id = register_video(&state).await;
    let app = test::init_service(create_app(state)).await;

    // no detections yet
    let req = test::TestRequest::get()
        .uri(&format!("/ai/summary?video_id={}", video_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["summary"].is_null());

    let req = test::TestRequest::post()
        .uri("/ai/analyze")
        .set_json(json!({"video_url": VIDEO_URL, "video_id": video_id}))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/ai/summary?video_id={}", video_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let summary = &body["summary"];
    assert_eq!(summary["total_frames"], 4);
    assert!(summary["object_counts"].is_object());
    assert!(summary["top_frames"].as_array().unwrap().len() <= 5);
    assert_eq!(summary["alerts"].as_array().unwrap().len(), 2);
    assert!(summary["summary_text"].is_string());
}

#[actix_web::test]
async fn test_streams_enriched_with_live_stats() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    seed_stream(&state, "stream-001").await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/streams/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let streams = body.as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["detection_count"], 0);
    assert!(streams[0]["last_alert"].is_null());

    // write one detection and one alert, then re-read
    let req = test::TestRequest::post()
        .uri("/detections/")
        .set_json(json!({
            "stream_id": "stream-001",
            "label": "Person",
            "confidence": 0.91,
            "bbox": {"x": 100, "y": 120, "width": 80, "height": 160},
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/alerts/")
        .set_json(json!({
            "stream_id": "stream-001",
            "message": "Person detected with 91% confidence",
            "level": "medium",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::get().uri("/streams/stream-001").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["detection_count"], 1);
    assert_eq!(body["last_alert"], "Person detected with 91% confidence");
}

#[actix_web::test]
async fn test_unknown_stream_returns_404() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get().uri("/streams/ghost").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_detection_list_limit_bounds() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let app = test::init_service(create_app(state)).await;

    let req = test::TestRequest::get()
        .uri("/detections/?limit=0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_detections_newest_first_with_limit() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    seed_stream(&state, "stream-001").await;
    let app = test::init_service(create_app(state)).await;

    for label in ["Person", "Vehicle", "Animal"] {
        let req = test::TestRequest::post()
            .uri("/detections/")
            .set_json(json!({
                "stream_id": "stream-001",
                "label": label,
                "confidence": 0.8,
                "bbox": {"x": 50, "y": 50, "width": 60, "height": 60},
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    let req = test::TestRequest::get()
        .uri("/detections/?stream_id=stream-001&limit=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let detections = body.as_array().unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0]["bbox"]["x"], 50);
}

#[actix_web::test]
async fn test_every_request_bumps_the_http_counter() {
    let temp_dir = TempDir::new().unwrap();
    let state = create_test_state(&temp_dir).await;
    let metrics = state.metrics.clone();
    let app = test::init_service(create_app(state)).await;

    assert_eq!(metrics.http_requests(), 0);
    test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    test::call_service(&app, test::TestRequest::get().uri("/streams/").to_request()).await;
    assert_eq!(metrics.http_requests(), 2);
}
