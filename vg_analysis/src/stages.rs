//! ABOUTME: The four analysis stages, each reading frames from a fresh source
//! ABOUTME: Detection propagates open failures; the other stages degrade to empty output

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vg_ai::ModelRegistry;
use vg_config::AnalysisConfig;
use vg_core::Result;
use vg_media::{collect_frames, sample_by_count, sample_by_stride, FrameSource, SourceOpener};

/// Returned by the summarization stage when caption generation fails
pub const SUMMARY_FALLBACK: &str = "Summary generation failed.";

/// Objects observed in one sampled frame.
///
/// `frame_index` is the sampling ordinal within the run (0, 1, 2, ...),
/// not the raw frame number skipped between samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDetections {
    pub frame_index: i64,
    pub objects: Vec<String>,
}

/// One hazard category that cleared the alert threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertScore {
    pub category: String,
    pub confidence: f64,
}

/// The four stages bound to a source opener and model registry
#[derive(Clone)]
pub struct Stages {
    opener: Arc<dyn SourceOpener>,
    models: ModelRegistry,
    config: AnalysisConfig,
}

impl Stages {
    pub fn new(opener: Arc<dyn SourceOpener>, models: ModelRegistry, config: AnalysisConfig) -> Self {
        Self {
            opener,
            models,
            config,
        }
    }

    /// Detection stage: stride sampling, per-frame object detection.
    ///
    /// Per-frame read or model failures are logged and skipped; a source
    /// that cannot be opened propagates `Error::Source` to the caller.
    pub async fn detect(&self, locator: &str) -> Result<Vec<FrameDetections>> {
        let source = self.opener.open(locator).await?;
        let indices = sample_by_stride(source.frame_count(), self.config.detection_stride)?;

        let mut results = Vec::with_capacity(indices.len());
        for (ordinal, &raw_index) in indices.iter().enumerate() {
            let frame = match source.read_frame(raw_index).await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(%locator, raw_index, error = %e, "Skipping unreadable frame");
                    continue;
                }
            };
            match self.models.detector.detect_objects(&frame).await {
                Ok(objects) => results.push(FrameDetections {
                    frame_index: ordinal as i64,
                    objects,
                }),
                Err(e) => {
                    warn!(%locator, raw_index, error = %e, "Detection failed for frame, skipping");
                }
            }
        }

        debug!(%locator, frames = results.len(), "Detection stage complete");
        Ok(results)
    }

    /// Classification stage: fixed-count sampling, one whole-clip inference,
    /// top label only. Any failure yields an empty vector.
    pub async fn classify(&self, locator: &str) -> Vec<String> {
        match self
            .try_classify(locator, self.config.classification_frame_count)
            .await
        {
            Ok(labels) => labels,
            Err(e) => {
                warn!(%locator, error = %e, "Classification stage failed, returning empty");
                Vec::new()
            }
        }
    }

    async fn try_classify(&self, locator: &str, count: usize) -> Result<Vec<String>> {
        let frames = self.sample_clip(locator, count).await?;
        let mut ranked = self.models.classifier.classify_clip(&frames).await?;
        ranked.truncate(1);
        Ok(ranked.into_iter().map(|l| l.label).collect())
    }

    /// Alert stage: hazard evaluation over a fixed-count sample, keeping
    /// scores at or above the configured threshold. Any failure yields an
    /// empty vector.
    pub async fn alerts(&self, locator: &str) -> Vec<AlertScore> {
        match self
            .try_alerts(locator, self.config.classification_frame_count)
            .await
        {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(%locator, error = %e, "Alert stage failed, returning empty");
                Vec::new()
            }
        }
    }

    async fn try_alerts(&self, locator: &str, count: usize) -> Result<Vec<AlertScore>> {
        let frames = self.sample_clip(locator, count).await?;
        let scores = self.models.hazards.detect_hazards(&frames).await?;
        Ok(scores
            .into_iter()
            .filter(|s| s.confidence >= self.config.alert_threshold)
            .map(|s| AlertScore {
                category: s.kind.to_string(),
                confidence: s.confidence,
            })
            .collect())
    }

    /// Summarization stage: caption a fixed-count sample frame by frame and
    /// join the captions with single spaces. Any failure yields the fixed
    /// fallback string.
    pub async fn summarize(&self, locator: &str) -> String {
        match self
            .try_summarize(locator, self.config.summary_frame_count)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(%locator, error = %e, "Summarization stage failed, using fallback");
                SUMMARY_FALLBACK.to_string()
            }
        }
    }

    async fn try_summarize(&self, locator: &str, count: usize) -> Result<String> {
        let frames = self.sample_clip(locator, count).await?;
        let mut captions = Vec::with_capacity(frames.len());
        for frame in &frames {
            captions.push(self.models.captioner.caption_frame(frame).await?);
        }
        Ok(captions.join(" "))
    }

    /// Open the source and collect a fixed-count sample, clamping the count
    /// to the source length so short videos still produce a clip.
    async fn sample_clip(&self, locator: &str, count: usize) -> Result<Vec<vg_media::Frame>> {
        let source: Box<dyn FrameSource> = self.opener.open(locator).await?;
        let total = source.frame_count();
        let effective = count.min(total as usize).max(1);
        let indices = sample_by_count(total, effective)?;
        collect_frames(source.as_ref(), &indices).await
    }
}
