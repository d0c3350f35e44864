//! ABOUTME: Video reference endpoints, metadata CRUD with cascading delete
//! ABOUTME: Deletion removes all analysis records, the row, and the stored file

use actix_web::{delete, get, post, web, HttpResponse};
use serde_json::json;
use tracing::{info, warn};
use validator::Validate;
use vg_db::{CreateVideoRequest, VideoRepository};
use vg_storage::VideoUri;

use crate::{
    error::{ApiError, ApiResult},
    models::VideoMetadataRequest,
    AppState,
};

/// Register metadata for an uploaded video
#[utoipa::path(
    post,
    path = "/videos/metadata",
    tag = "videos",
    request_body = VideoMetadataRequest,
    responses(
        (status = 200, description = "Metadata saved"),
        (status = 400, description = "Validation failure", body = crate::models::ErrorResponse),
    )
)]
#[post("/metadata")]
pub async fn save_metadata(
    state: web::Data<AppState>,
    payload: web::Json<VideoMetadataRequest>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;

    let request = payload.into_inner();
    let video = VideoRepository::new(state.db.pool())
        .create(CreateVideoRequest {
            filename: request.filename,
            storage_url: request.storage_url,
            uploaded_at: request.uploaded_at,
        })
        .await?;

    info!(video_id = %video.id, filename = %video.filename, "Video metadata saved");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Metadata saved",
        "video": video,
    })))
}

/// List uploaded videos newest-first
#[utoipa::path(
    get,
    path = "/videos/",
    tag = "videos",
    responses(
        (status = 200, description = "Uploaded videos"),
    )
)]
#[get("/")]
pub async fn list_videos(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let videos = VideoRepository::new(state.db.pool()).list().await?;
    Ok(HttpResponse::Ok().json(videos))
}

/// Delete a video, its analysis records, and the stored file
#[utoipa::path(
    delete,
    path = "/videos/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video identifier")),
    responses(
        (status = 200, description = "Video deleted"),
        (status = 404, description = "Unknown video id", body = crate::models::ErrorResponse),
    )
)]
#[delete("/{id}")]
pub async fn delete_video(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let video_id = path.into_inner();

    let video = VideoRepository::new(state.db.pool())
        .find_by_id(&video_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    let deleted = VideoRepository::new(state.db.pool())
        .delete_cascade(&video_id)
        .await?;
    if !deleted {
        return Err(ApiError::not_found("Video not found"));
    }

    // the records are gone; removing the file is best-effort since the
    // reference may point at an external URL we do not manage
    match VideoUri::new(&video.storage_url) {
        Ok(uri) => {
            if let Err(e) = state.storage.delete(&uri).await {
                warn!(video_id = %video_id, error = %e, "Failed to delete stored video file");
            }
        }
        Err(_) => {
            warn!(video_id = %video_id, url = %video.storage_url, "Unmanaged storage URL, skipping file delete");
        }
    }

    info!(video_id = %video_id, "Video deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Video deleted successfully"
    })))
}
