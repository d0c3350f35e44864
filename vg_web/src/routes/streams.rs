//! ABOUTME: Stream endpoints enriched with live detection counts and latest alerts
//! ABOUTME: Joins stream rows against the simulator-written record tables

use actix_web::{get, web, HttpResponse};
use vg_db::{Stream, StreamAlertRepository, StreamDetectionRepository, StreamRepository};

use crate::{
    error::{ApiError, ApiResult},
    models::StreamView,
    AppState,
};

async fn enrich(state: &AppState, stream: Stream) -> ApiResult<StreamView> {
    let detection_count = StreamDetectionRepository::new(state.db.pool())
        .count_for_stream(&stream.id)
        .await?;
    let last_alert = StreamAlertRepository::new(state.db.pool())
        .latest_for_stream(&stream.id)
        .await?
        .map(|a| a.message);

    Ok(StreamView {
        id: stream.id,
        name: stream.name,
        status: stream.status,
        thumbnail: stream.thumbnail,
        detection_count,
        last_alert,
        uptime: stream.uptime,
    })
}

/// List all streams with their live stats
#[utoipa::path(
    get,
    path = "/streams/",
    tag = "streams",
    responses(
        (status = 200, description = "All streams", body = [StreamView]),
    )
)]
#[get("/")]
pub async fn list_streams(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let streams = StreamRepository::new(state.db.pool()).list().await?;

    let mut views = Vec::with_capacity(streams.len());
    for stream in streams {
        views.push(enrich(&state, stream).await?);
    }

    Ok(HttpResponse::Ok().json(views))
}

/// Get one stream by id with its live stats
#[utoipa::path(
    get,
    path = "/streams/{id}",
    tag = "streams",
    params(("id" = String, Path, description = "Stream identifier")),
    responses(
        (status = 200, description = "The stream", body = StreamView),
        (status = 404, description = "Unknown stream id", body = crate::models::ErrorResponse),
    )
)]
#[get("/{id}")]
pub async fn get_stream(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let stream_id = path.into_inner();
    let stream = StreamRepository::new(state.db.pool())
        .find_by_id(&stream_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Stream not found"))?;

    let view = enrich(&state, stream).await?;
    Ok(HttpResponse::Ok().json(view))
}
