//! ABOUTME: Remote inference backend speaking JSON over HTTP
//! ABOUTME: Sends base64 frame payloads to a model server and maps its responses

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use vg_core::{Error, Result};
use vg_media::Frame;

use crate::{
    ClipClassifier, FrameCaptioner, HazardDetector, HazardKind, HazardScore, LabelScore,
    ModelConfig, ObjectDetector,
};

/// HTTP client for a remote model server exposing detect, classify,
/// hazards and caption endpoints.
pub struct RemoteBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct FramePayload {
    index: u64,
    data: String,
}

#[derive(Debug, Serialize)]
struct DetectRequest {
    frame: FramePayload,
}

#[derive(Debug, Serialize)]
struct ClipRequest {
    frames: Vec<FramePayload>,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    objects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    labels: Vec<LabelScore>,
}

#[derive(Debug, Deserialize)]
struct HazardsResponse {
    hazards: Vec<RemoteHazard>,
}

#[derive(Debug, Deserialize)]
struct RemoteHazard {
    kind: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    caption: String,
}

impl RemoteBackend {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or("http://localhost:8800")
            .trim_end_matches('/')
            .to_string();
        debug!(base_url = %base_url, "created remote model backend");

        Ok(Self { client, base_url })
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        self.client.post(&url).header("Content-Type", "application/json")
    }

    async fn execute<T>(&self, request: RequestBuilder) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = request
            .send()
            .await
            .map_err(|e| Error::External(format!("model server request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(Error::External(format!(
                "model server error ({}): {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::External(format!("failed to parse model response: {}", e)))
    }

    fn encode_frame(frame: &Frame) -> FramePayload {
        FramePayload {
            index: frame.index,
            data: base64::engine::general_purpose::STANDARD.encode(&frame.data),
        }
    }

    fn encode_clip(frames: &[Frame]) -> ClipRequest {
        ClipRequest {
            frames: frames.iter().map(Self::encode_frame).collect(),
        }
    }
}

#[async_trait]
impl ObjectDetector for RemoteBackend {
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<String>> {
        let body = DetectRequest {
            frame: Self::encode_frame(frame),
        };
        let response: DetectResponse = self.execute(self.post("/v1/detect").json(&body)).await?;
        Ok(response.objects)
    }
}

#[async_trait]
impl ClipClassifier for RemoteBackend {
    async fn classify_clip(&self, frames: &[Frame]) -> Result<Vec<LabelScore>> {
        let body = Self::encode_clip(frames);
        let response: ClassifyResponse =
            self.execute(self.post("/v1/classify").json(&body)).await?;
        Ok(response.labels)
    }
}

#[async_trait]
impl HazardDetector for RemoteBackend {
    async fn detect_hazards(&self, frames: &[Frame]) -> Result<Vec<HazardScore>> {
        let body = Self::encode_clip(frames);
        let response: HazardsResponse =
            self.execute(self.post("/v1/hazards").json(&body)).await?;
        Ok(response
            .hazards
            .into_iter()
            .filter_map(|h| {
                let kind = match h.kind.as_str() {
                    "fire" => HazardKind::Fire,
                    "violence" => HazardKind::Violence,
                    "accident" => HazardKind::Accident,
                    other => {
                        debug!(kind = %other, "ignoring unknown hazard kind");
                        return None;
                    }
                };
                Some(HazardScore {
                    kind,
                    confidence: h.confidence.clamp(0.0, 1.0),
                })
            })
            .collect())
    }
}

#[async_trait]
impl FrameCaptioner for RemoteBackend {
    async fn caption_frame(&self, frame: &Frame) -> Result<String> {
        let body = DetectRequest {
            frame: Self::encode_frame(frame),
        };
        let response: CaptionResponse =
            self.execute(self.post("/v1/caption").json(&body)).await?;
        Ok(response.caption)
    }
}
