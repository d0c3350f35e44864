//! ABOUTME: Aggregated summary view over persisted analysis records
//! ABOUTME: Pure aggregation over rows, no fresh inference

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use vg_core::Result;
use vg_db::{
    VideoAlertRepository, VideoClassificationRepository, VideoDetectionRepository,
    VideoSummaryRepository,
};

use crate::stages::AlertScore;

const TOP_FRAME_LIMIT: usize = 5;

/// One frame ranked by how many objects it contained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameObjectCount {
    pub frame_index: i64,
    pub object_count: usize,
}

/// Aggregate of everything persisted for one video id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryView {
    pub video_id: String,
    /// Count of distinct frame indices across all detection records
    pub total_frames: usize,
    /// Object label to total occurrence count across all frames
    pub object_counts: BTreeMap<String, usize>,
    /// Top frames by descending object count, ascending index on ties
    pub top_frames: Vec<FrameObjectCount>,
    /// Labels from the latest classification record
    pub classification: Vec<String>,
    pub alerts: Vec<AlertScore>,
    /// Text of the latest summary record
    pub summary_text: Option<String>,
}

/// Aggregate the detection rows into the frame/object statistics.
///
/// Repeated frame indices (from multiple runs) are merged: object counts
/// accumulate and each index counts once toward the distinct total.
fn aggregate_detections(
    rows: &[(i64, Vec<String>)],
) -> (usize, BTreeMap<String, usize>, Vec<FrameObjectCount>) {
    let mut object_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut per_frame: BTreeMap<i64, usize> = BTreeMap::new();

    for (frame_index, objects) in rows {
        *per_frame.entry(*frame_index).or_insert(0) += objects.len();
        for label in objects {
            *object_counts.entry(label.clone()).or_insert(0) += 1;
        }
    }

    let total_frames = per_frame.len();

    let mut ranked: Vec<FrameObjectCount> = per_frame
        .into_iter()
        .map(|(frame_index, object_count)| FrameObjectCount {
            frame_index,
            object_count,
        })
        .collect();
    // BTreeMap iteration already yields ascending frame_index, so a stable
    // sort by descending count preserves the ascending-index tiebreak
    ranked.sort_by(|a, b| b.object_count.cmp(&a.object_count));
    ranked.truncate(TOP_FRAME_LIMIT);

    (total_frames, object_counts, ranked)
}

/// Build the summary view for a video id from persisted records only.
///
/// Returns `None` when no detection records exist for the id.
pub async fn build_summary_view(pool: &SqlitePool, video_id: &str) -> Result<Option<SummaryView>> {
    let detections = VideoDetectionRepository::new(pool)
        .list_for_video(video_id)
        .await?;
    if detections.is_empty() {
        return Ok(None);
    }

    let rows: Vec<(i64, Vec<String>)> = detections
        .iter()
        .map(|d| (d.frame_index, d.object_labels()))
        .collect();
    let (total_frames, object_counts, top_frames) = aggregate_detections(&rows);

    let classification = VideoClassificationRepository::new(pool)
        .latest_for_video(video_id)
        .await?
        .map(|c| c.label_list())
        .unwrap_or_default();

    let alerts = VideoAlertRepository::new(pool)
        .list_for_video(video_id)
        .await?
        .into_iter()
        .map(|a| AlertScore {
            category: a.category,
            confidence: a.confidence,
        })
        .collect();

    let summary_text = VideoSummaryRepository::new(pool)
        .latest_for_video(video_id)
        .await?
        .map(|s| s.summary_text);

    Ok(Some(SummaryView {
        video_id: video_id.to_string(),
        total_frames,
        object_counts,
        top_frames,
        classification,
        alerts,
        summary_text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_counts_objects_across_frames() {
        let rows = vec![
            (0, vec!["person".to_string()]),
            (30, vec!["person".to_string(), "car".to_string()]),
        ];
        let (total_frames, object_counts, top_frames) = aggregate_detections(&rows);

        assert_eq!(total_frames, 2);
        assert_eq!(object_counts.get("person"), Some(&2));
        assert_eq!(object_counts.get("car"), Some(&1));
        assert_eq!(
            top_frames,
            vec![
                FrameObjectCount {
                    frame_index: 30,
                    object_count: 2
                },
                FrameObjectCount {
                    frame_index: 0,
                    object_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_ties_broken_by_ascending_frame_index() {
        let rows = vec![
            (7, vec!["dog".to_string()]),
            (3, vec!["cat".to_string()]),
            (5, vec!["bird".to_string()]),
        ];
        let (_, _, top_frames) = aggregate_detections(&rows);

        let indices: Vec<i64> = top_frames.iter().map(|f| f.frame_index).collect();
        assert_eq!(indices, vec![3, 5, 7]);
    }

    #[test]
    fn test_top_frames_capped_at_five() {
        let rows: Vec<(i64, Vec<String>)> = (0..8)
            .map(|i| (i, vec!["person".to_string(); (i as usize) + 1]))
            .collect();
        let (total_frames, _, top_frames) = aggregate_detections(&rows);

        assert_eq!(total_frames, 8);
        assert_eq!(top_frames.len(), 5);
        assert_eq!(top_frames[0].frame_index, 7);
        assert_eq!(top_frames[0].object_count, 8);
    }

    #[test]
    fn test_empty_frames_count_toward_total() {
        let rows = vec![(0, vec![]), (1, vec!["person".to_string()])];
        let (total_frames, object_counts, top_frames) = aggregate_detections(&rows);

        assert_eq!(total_frames, 2);
        assert_eq!(object_counts.len(), 1);
        assert_eq!(top_frames[0].frame_index, 1);
    }
}
