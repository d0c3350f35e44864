//! ABOUTME: Request and response models for the REST API
//! ABOUTME: Validation via validator derive, OpenAPI schemas via utoipa

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;
use vg_db::BoundingBox;

/// Standard error response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

/// Body for `POST /ai/analyze`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnalyzeRequest {
    #[validate(length(min = 1))]
    pub video_url: String,
    #[validate(length(min = 1))]
    pub video_id: String,
}

/// Query for `GET /ai/summary`
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub video_id: String,
}

/// Body for `POST /videos/metadata`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VideoMetadataRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1))]
    pub storage_url: String,
    #[validate(length(min = 1))]
    pub uploaded_at: String,
}

/// A stream enriched with its live detection count and latest alert
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StreamView {
    pub id: String,
    pub name: String,
    pub status: String,
    pub thumbnail: String,
    pub detection_count: i64,
    pub last_alert: Option<String>,
    pub uptime: String,
}

/// Live detection with its bounding box decoded
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetectionView {
    pub id: String,
    pub stream_id: String,
    pub label: String,
    pub confidence: f64,
    #[schema(value_type = Object)]
    pub bbox: BoundingBox,
    pub created_at: String,
}

/// Query for listing live detections
#[derive(Debug, Deserialize)]
pub struct ListDetectionsQuery {
    pub stream_id: Option<String>,
    #[serde(default = "default_detection_limit")]
    pub limit: i64,
}

fn default_detection_limit() -> i64 {
    20
}

/// Body for `POST /detections/`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDetectionRequest {
    #[validate(length(min = 1))]
    pub stream_id: String,
    #[validate(length(min = 1))]
    pub label: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f64,
    #[schema(value_type = Object)]
    pub bbox: BoundingBox,
}

/// Query for listing live alerts
#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub stream_id: Option<String>,
    #[serde(default = "default_alert_limit")]
    pub limit: i64,
}

fn default_alert_limit() -> i64 {
    5
}

/// Body for `POST /alerts/`
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAlertRequest {
    #[validate(length(min = 1))]
    pub stream_id: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[validate(length(min = 1))]
    pub level: String,
}
