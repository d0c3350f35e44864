//! ABOUTME: Live detection endpoints over the simulator-written records
//! ABOUTME: List newest-first with optional stream filter, plus direct creation

use actix_web::{get, post, web, HttpResponse};
use tracing::info;
use validator::Validate;
use vg_db::{CreateStreamDetectionRequest, StreamDetection, StreamDetectionRepository};

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateDetectionRequest, DetectionView, ListDetectionsQuery},
    AppState,
};

const MAX_LIMIT: i64 = 500;

fn to_view(detection: StreamDetection) -> ApiResult<DetectionView> {
    let bbox = detection.bounding_box()?;
    Ok(DetectionView {
        id: detection.id,
        stream_id: detection.stream_id,
        label: detection.label,
        confidence: detection.confidence,
        bbox,
        created_at: detection.created_at,
    })
}

/// List live detections newest-first
#[utoipa::path(
    get,
    path = "/detections/",
    tag = "detections",
    params(
        ("stream_id" = Option<String>, Query, description = "Filter by stream"),
        ("limit" = Option<i64>, Query, description = "Row limit, default 20"),
    ),
    responses(
        (status = 200, description = "Live detections", body = [DetectionView]),
    )
)]
#[get("/")]
pub async fn list_detections(
    state: web::Data<AppState>,
    query: web::Query<ListDetectionsQuery>,
) -> ApiResult<HttpResponse> {
    if query.limit < 1 || query.limit > MAX_LIMIT {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let detections = StreamDetectionRepository::new(state.db.pool())
        .list(query.stream_id.as_deref(), query.limit)
        .await?;

    let views: Vec<DetectionView> = detections
        .into_iter()
        .map(to_view)
        .collect::<ApiResult<_>>()?;
    Ok(HttpResponse::Ok().json(views))
}

/// Create a live detection directly
#[utoipa::path(
    post,
    path = "/detections/",
    tag = "detections",
    request_body = CreateDetectionRequest,
    responses(
        (status = 200, description = "The created detection", body = DetectionView),
        (status = 400, description = "Validation failure", body = crate::models::ErrorResponse),
    )
)]
#[post("/")]
pub async fn create_detection(
    state: web::Data<AppState>,
    payload: web::Json<CreateDetectionRequest>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;

    let request = payload.into_inner();
    info!(stream_id = %request.stream_id, label = %request.label, "Creating live detection");

    let detection = StreamDetectionRepository::new(state.db.pool())
        .create(CreateStreamDetectionRequest {
            stream_id: request.stream_id,
            label: request.label,
            confidence: request.confidence,
            bbox: request.bbox,
        })
        .await?;

    Ok(HttpResponse::Ok().json(to_view(detection)?))
}
