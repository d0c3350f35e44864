//! ABOUTME: Video analysis pipeline crate
//! ABOUTME: Stages, orchestration with atomic persistence, and the summary read path

pub mod orchestrator;
pub mod stages;
pub mod summary;

pub use orchestrator::{AnalysisOutcome, Orchestrator};
pub use stages::{AlertScore, FrameDetections, Stages, SUMMARY_FALLBACK};
pub use summary::{build_summary_view, FrameObjectCount, SummaryView};
