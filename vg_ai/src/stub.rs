//! ABOUTME: Stub model backends with canned deterministic responses
//! ABOUTME: No model downloads, no network; outputs keyed off frame size

use async_trait::async_trait;
use vg_core::Result;
use vg_media::Frame;

use crate::{
    ClipClassifier, FrameCaptioner, HazardDetector, HazardKind, HazardScore, LabelScore,
    ObjectDetector,
};

/// Deterministic object detector keyed off frame byte length
pub struct StubDetector;

#[async_trait]
impl ObjectDetector for StubDetector {
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<String>> {
        let labels: Vec<&str> = match frame.data.len() % 5 {
            0 => vec!["person", "chair"],
            1 => vec!["car", "tree", "building"],
            2 => vec!["dog", "grass"],
            3 => vec!["person"],
            _ => vec![],
        };
        Ok(labels.into_iter().map(String::from).collect())
    }
}

/// Deterministic clip classifier keyed off total clip byte length
pub struct StubClassifier;

#[async_trait]
impl ClipClassifier for StubClassifier {
    async fn classify_clip(&self, frames: &[Frame]) -> Result<Vec<LabelScore>> {
        let total: usize = frames.iter().map(|f| f.data.len()).sum();
        let ranked = match total % 3 {
            0 => [("walking the dog", 0.91), ("running", 0.06)],
            1 => [("driving car", 0.88), ("riding a bike", 0.07)],
            _ => [("playing guitar", 0.84), ("singing", 0.09)],
        };
        Ok(ranked
            .into_iter()
            .map(|(label, score)| LabelScore {
                label: label.to_string(),
                score,
            })
            .collect())
    }
}

/// Placeholder hazard evaluation pending a real model.
///
/// Emits the same fixed scores for every clip so downstream alert
/// thresholding stays exercised.
pub struct StubHazardDetector;

#[async_trait]
impl HazardDetector for StubHazardDetector {
    async fn detect_hazards(&self, _frames: &[Frame]) -> Result<Vec<HazardScore>> {
        Ok(vec![
            HazardScore {
                kind: HazardKind::Fire,
                confidence: 0.87,
            },
            HazardScore {
                kind: HazardKind::Violence,
                confidence: 0.72,
            },
        ])
    }
}

/// Deterministic frame captioner keyed off frame byte length
pub struct StubCaptioner;

#[async_trait]
impl FrameCaptioner for StubCaptioner {
    async fn caption_frame(&self, frame: &Frame) -> Result<String> {
        let caption = match frame.data.len() % 3 {
            0 => "a person standing in a room",
            1 => "a car parked on the street",
            _ => "a dog running across a field",
        };
        Ok(caption.to_string())
    }
}
