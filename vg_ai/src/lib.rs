//! ABOUTME: Model backend abstraction with stub and remote implementations
//! ABOUTME: The pipeline depends on these traits, never on a concrete model

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vg_core::Result;
use vg_media::Frame;

pub mod stub;
#[cfg(feature = "ai_remote")]
pub mod remote;

pub use stub::{StubCaptioner, StubClassifier, StubDetector, StubHazardDetector};

/// Fixed vocabulary of hazardous-event categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    Fire,
    Violence,
    Accident,
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HazardKind::Fire => "fire",
            HazardKind::Violence => "violence",
            HazardKind::Accident => "accident",
        };
        write!(f, "{}", s)
    }
}

/// One hazard category with its confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardScore {
    pub kind: HazardKind,
    pub confidence: f64,
}

/// One classification label with its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Per-frame object detection
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Distinct object labels observed in one frame
    async fn detect_objects(&self, frame: &Frame) -> Result<Vec<String>>;
}

/// Whole-clip classification over a fixed-size frame subset
#[async_trait]
pub trait ClipClassifier: Send + Sync {
    /// Labels ranked by descending probability
    async fn classify_clip(&self, frames: &[Frame]) -> Result<Vec<LabelScore>>;
}

/// Hazard evaluation over a frame subset
#[async_trait]
pub trait HazardDetector: Send + Sync {
    async fn detect_hazards(&self, frames: &[Frame]) -> Result<Vec<HazardScore>>;
}

/// Natural-language caption for a single frame
#[async_trait]
pub trait FrameCaptioner: Send + Sync {
    async fn caption_frame(&self, frame: &Frame) -> Result<String>;
}

/// Configuration for model backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Use remote inference services instead of the deterministic stubs
    pub use_remote: bool,
    /// Base URL for the remote inference gateway
    pub base_url: Option<String>,
    /// Request timeout in seconds for remote backends
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            use_remote: false, // stubs by default, nothing to download
            base_url: None,
            timeout_seconds: 30,
        }
    }
}

/// Handles to the loaded model backends, constructed once at startup and
/// injected into the orchestrator (no ambient global model state).
#[derive(Clone)]
pub struct ModelRegistry {
    pub detector: Arc<dyn ObjectDetector>,
    pub classifier: Arc<dyn ClipClassifier>,
    pub hazards: Arc<dyn HazardDetector>,
    pub captioner: Arc<dyn FrameCaptioner>,
}

impl ModelRegistry {
    /// Registry backed entirely by deterministic stubs
    pub fn stub() -> Self {
        debug!("Creating stub model registry");
        Self {
            detector: Arc::new(StubDetector),
            classifier: Arc::new(StubClassifier),
            hazards: Arc::new(StubHazardDetector),
            captioner: Arc::new(StubCaptioner),
        }
    }

    /// Build a registry from configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        if config.use_remote {
            #[cfg(feature = "ai_remote")]
            {
                match remote::RemoteBackend::new(config) {
                    Ok(backend) => {
                        debug!("Creating remote model registry");
                        let backend = Arc::new(backend);
                        return Self {
                            detector: backend.clone(),
                            classifier: backend.clone(),
                            hazards: backend.clone(),
                            captioner: backend,
                        };
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Remote backend unavailable, using stubs");
                    }
                }
            }
            #[cfg(not(feature = "ai_remote"))]
            {
                tracing::warn!("Remote models requested but ai_remote feature not enabled, using stubs");
            }
        }
        Self::stub()
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_kind_display_and_serde() {
        assert_eq!(HazardKind::Fire.to_string(), "fire");
        let json = serde_json::to_string(&HazardKind::Violence).unwrap();
        assert_eq!(json, "\"violence\"");
        let parsed: HazardKind = serde_json::from_str("\"accident\"").unwrap();
        assert_eq!(parsed, HazardKind::Accident);
    }

    #[test]
    fn test_model_config_defaults_to_stub() {
        let config = ModelConfig::default();
        assert!(!config.use_remote);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[tokio::test]
    async fn test_registry_from_default_config_is_usable() {
        let registry = ModelRegistry::from_config(&ModelConfig::default());
        let frame = Frame {
            index: 0,
            data: bytes::Bytes::from_static(b"12345"),
        };
        let labels = registry.detector.detect_objects(&frame).await.unwrap();
        assert!(!labels.is_empty());
    }
}
