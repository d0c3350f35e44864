//! ABOUTME: Integration tests for repositories and transactional writers
//! ABOUTME: Runs against a throwaway SQLite database per test

use sqlx::Row;
use tempfile::TempDir;
use vg_db::{
    insert_analysis_run, insert_live_event, AnalysisRun, BoundingBox, CreateStreamAlertRequest,
    CreateStreamDetectionRequest, CreateVideoRequest, Db, DbOptions, StreamAlertRepository,
    StreamDetectionRepository, StreamRepository, UpsertStreamRequest, VideoAlertRepository,
    VideoClassificationRepository, VideoDetectionRepository, VideoRepository,
    VideoSummaryRepository,
};

async fn create_test_db(temp_dir: &TempDir) -> Db {
    let db_path = temp_dir.path().join("test.db");
    Db::new(&db_path.to_string_lossy())
        .await
        .expect("Failed to create test database")
}

async fn seed_stream(db: &Db, id: &str) {
    StreamRepository::new(db.pool())
        .upsert(UpsertStreamRequest {
            id: id.to_string(),
            name: "Test Stream".to_string(),
            status: "active".to_string(),
            thumbnail: "/placeholder.svg".to_string(),
            uptime: "99.9%".to_string(),
        })
        .await
        .expect("Failed to seed stream");
}

async fn seed_video(db: &Db) -> String {
    VideoRepository::new(db.pool())
        .create(CreateVideoRequest {
            filename: "clip.mp4".to_string(),
            storage_url: "file:///tmp/clip.mp4".to_string(),
            uploaded_at: "2024-06-01T12:00:00Z".to_string(),
        })
        .await
        .expect("Failed to create video")
        .id
}

fn sample_run(video_id: &str) -> AnalysisRun {
    AnalysisRun {
        video_id: video_id.to_string(),
        detections: vec![
            (0, vec!["person".to_string()]),
            (1, vec!["person".to_string(), "car".to_string()]),
        ],
        classification: vec!["driving car".to_string()],
        alerts: vec![("fire".to_string(), 0.87)],
        summary: "a car on a road".to_string(),
    }
}

#[tokio::test]
async fn test_db_options_control_journal_mode() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("rollback-journal.db");
    let db = Db::with_options(
        &db_path.to_string_lossy(),
        DbOptions {
            pool_size: 2,
            sqlite_wal: false,
        },
    )
    .await
    .unwrap();

    let row = sqlx::query("PRAGMA journal_mode")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let mode: String = row.get(0);
    assert_eq!(mode.to_lowercase(), "delete");
}

#[tokio::test]
async fn test_default_journal_mode_is_wal() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;

    let row = sqlx::query("PRAGMA journal_mode")
        .fetch_one(db.pool())
        .await
        .unwrap();
    let mode: String = row.get(0);
    assert_eq!(mode.to_lowercase(), "wal");
}

#[tokio::test]
async fn test_video_crud_ordering() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let repo = VideoRepository::new(db.pool());

    let older = repo
        .create(CreateVideoRequest {
            filename: "old.mp4".to_string(),
            storage_url: "file:///tmp/old.mp4".to_string(),
            uploaded_at: "2024-01-01T00:00:00Z".to_string(),
        })
        .await
        .unwrap();
    let newer = repo
        .create(CreateVideoRequest {
            filename: "new.mp4".to_string(),
            storage_url: "file:///tmp/new.mp4".to_string(),
            uploaded_at: "2024-02-01T00:00:00Z".to_string(),
        })
        .await
        .unwrap();

    let listed = repo.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id, "newest upload first");
    assert_eq!(listed[1].id, older.id);

    let found = repo.find_by_id(&older.id).await.unwrap();
    assert_eq!(found.unwrap().filename, "old.mp4");
    assert!(repo.find_by_id("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stream_upsert_refreshes_fields() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let repo = StreamRepository::new(db.pool());

    seed_stream(&db, "stream-001").await;
    let updated = repo
        .upsert(UpsertStreamRequest {
            id: "stream-001".to_string(),
            name: "Main Entrance".to_string(),
            status: "active".to_string(),
            thumbnail: "/placeholder.svg".to_string(),
            uptime: "99.2%".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(updated.name, "Main Entrance");
    assert_eq!(repo.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_live_event_written_atomically() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    seed_stream(&db, "stream-001").await;

    insert_live_event(
        db.pool(),
        CreateStreamDetectionRequest {
            stream_id: "stream-001".to_string(),
            label: "Person".to_string(),
            confidence: 0.91,
            bbox: BoundingBox {
                x: 50,
                y: 60,
                width: 100,
                height: 120,
            },
        },
        CreateStreamAlertRequest {
            stream_id: "stream-001".to_string(),
            message: "Person detected with 91% confidence".to_string(),
            level: "medium".to_string(),
        },
    )
    .await
    .unwrap();

    let detections = StreamDetectionRepository::new(db.pool())
        .list(Some("stream-001"), 20)
        .await
        .unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].label, "Person");
    let bbox = detections[0].bounding_box().unwrap();
    assert_eq!(bbox.x, 50);

    let alert = StreamAlertRepository::new(db.pool())
        .latest_for_stream("stream-001")
        .await
        .unwrap()
        .unwrap();
    assert!(alert.message.contains("Person"));
}

#[tokio::test]
async fn test_live_event_rejected_for_unknown_stream() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;

    let result = insert_live_event(
        db.pool(),
        CreateStreamDetectionRequest {
            stream_id: "no-such-stream".to_string(),
            label: "Person".to_string(),
            confidence: 0.91,
            bbox: BoundingBox {
                x: 0,
                y: 0,
                width: 10,
                height: 10,
            },
        },
        CreateStreamAlertRequest {
            stream_id: "no-such-stream".to_string(),
            message: "Person detected".to_string(),
            level: "low".to_string(),
        },
    )
    .await;

    assert!(result.is_err(), "foreign key should reject unknown stream");
    let detections = StreamDetectionRepository::new(db.pool())
        .list(None, 20)
        .await
        .unwrap();
    assert!(detections.is_empty(), "rollback leaves no partial rows");
}

#[tokio::test]
async fn test_analysis_run_persists_all_records() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;

    insert_analysis_run(db.pool(), &sample_run(&video_id))
        .await
        .unwrap();

    let detections = VideoDetectionRepository::new(db.pool())
        .list_for_video(&video_id)
        .await
        .unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].frame_index, 0);
    assert_eq!(
        detections[1].object_labels(),
        vec!["person".to_string(), "car".to_string()]
    );

    let classification = VideoClassificationRepository::new(db.pool())
        .latest_for_video(&video_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(classification.label_list(), vec!["driving car".to_string()]);

    let alerts = VideoAlertRepository::new(db.pool())
        .list_for_video(&video_id)
        .await
        .unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].category, "fire");

    let summary = VideoSummaryRepository::new(db.pool())
        .latest_for_video(&video_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.summary_text, "a car on a road");
}

#[tokio::test]
async fn test_analysis_run_rolls_back_for_unknown_video() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;

    let result = insert_analysis_run(db.pool(), &sample_run("missing-video")).await;
    assert!(result.is_err(), "foreign key should reject unknown video");

    let detections = VideoDetectionRepository::new(db.pool())
        .list_for_video("missing-video")
        .await
        .unwrap();
    assert!(detections.is_empty());
    let summary = VideoSummaryRepository::new(db.pool())
        .latest_for_video("missing-video")
        .await
        .unwrap();
    assert!(summary.is_none(), "no partial rows after rollback");
}

#[tokio::test]
async fn test_latest_picks_most_recent_run() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;

    insert_analysis_run(db.pool(), &sample_run(&video_id))
        .await
        .unwrap();

    let mut second = sample_run(&video_id);
    second.classification = vec!["walking".to_string()];
    second.summary = "a person walking".to_string();
    insert_analysis_run(db.pool(), &second).await.unwrap();

    let classification = VideoClassificationRepository::new(db.pool())
        .latest_for_video(&video_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(classification.label_list(), vec!["walking".to_string()]);

    let summary = VideoSummaryRepository::new(db.pool())
        .latest_for_video(&video_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.summary_text, "a person walking");
}

#[tokio::test]
async fn test_delete_cascade_removes_all_records() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    let video_id = seed_video(&db).await;

    insert_analysis_run(db.pool(), &sample_run(&video_id))
        .await
        .unwrap();

    let deleted = VideoRepository::new(db.pool())
        .delete_cascade(&video_id)
        .await
        .unwrap();
    assert!(deleted);

    assert!(VideoRepository::new(db.pool())
        .find_by_id(&video_id)
        .await
        .unwrap()
        .is_none());
    assert!(VideoDetectionRepository::new(db.pool())
        .list_for_video(&video_id)
        .await
        .unwrap()
        .is_empty());
    assert!(VideoAlertRepository::new(db.pool())
        .list_for_video(&video_id)
        .await
        .unwrap()
        .is_empty());
    assert!(VideoSummaryRepository::new(db.pool())
        .latest_for_video(&video_id)
        .await
        .unwrap()
        .is_none());

    // Second delete reports missing
    let deleted_again = VideoRepository::new(db.pool())
        .delete_cascade(&video_id)
        .await
        .unwrap();
    assert!(!deleted_again);
}

#[tokio::test]
async fn test_list_respects_limit_and_filter() {
    let temp_dir = TempDir::new().unwrap();
    let db = create_test_db(&temp_dir).await;
    seed_stream(&db, "stream-001").await;
    seed_stream(&db, "stream-002").await;

    let repo = StreamDetectionRepository::new(db.pool());
    for (i, stream_id) in ["stream-001", "stream-001", "stream-002"].iter().enumerate() {
        repo.create(CreateStreamDetectionRequest {
            stream_id: stream_id.to_string(),
            label: format!("Object-{}", i),
            confidence: 0.8,
            bbox: BoundingBox {
                x: 10,
                y: 10,
                width: 20,
                height: 20,
            },
        })
        .await
        .unwrap();
    }

    let all = repo.list(None, 2).await.unwrap();
    assert_eq!(all.len(), 2, "limit applies");

    let filtered = repo.list(Some("stream-002"), 20).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].stream_id, "stream-002");

    assert_eq!(repo.count_for_stream("stream-001").await.unwrap(), 2);
}
