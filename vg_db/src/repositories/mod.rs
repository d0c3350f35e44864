//! ABOUTME: Repository modules, one per persisted entity
//! ABOUTME: Plus transactional writers for analysis runs and simulator ticks

pub mod analysis_runs;
pub mod live_events;
pub mod stream_alerts;
pub mod stream_detections;
pub mod streams;
pub mod video_alerts;
pub mod video_classifications;
pub mod video_detections;
pub mod video_summaries;
pub mod videos;
