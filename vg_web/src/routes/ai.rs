//! ABOUTME: Analysis endpoints, the pipeline trigger and the aggregate read path
//! ABOUTME: Analyze runs the pipeline on a spawned task to contain backend panics

use actix_web::{get, post, web, HttpResponse};
use serde_json::json;
use tracing::{error, info};
use validator::Validate;
use vg_analysis::build_summary_view;

use crate::{
    error::{ApiError, ApiResult},
    models::{AnalyzeRequest, SummaryQuery},
    AppState,
};

/// Run the full analysis pipeline for a registered video
#[utoipa::path(
    post,
    path = "/ai/analyze",
    tag = "ai",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis results, committed atomically"),
        (status = 404, description = "Unknown video id", body = crate::models::ErrorResponse),
        (status = 500, description = "Analysis failed", body = crate::models::ErrorResponse),
    )
)]
#[post("/analyze")]
pub async fn analyze(
    state: web::Data<AppState>,
    payload: web::Json<AnalyzeRequest>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;

    info!(video_id = %payload.video_id, video_url = %payload.video_url, "Analysis requested");

    let orchestrator = state.orchestrator.clone();
    let metrics = state.metrics.clone();
    let video_id = payload.video_id.clone();
    let video_url = payload.video_url.clone();

    // the handler awaits the task, so the spawn is a panic boundary:
    // a panicking model backend becomes a 500 instead of unwinding
    // through the actix worker
    let outcome = tokio::spawn(async move {
        let timer = vg_core::time::MonotonicTimer::new();
        let result = orchestrator.analyze(&video_id, &video_url).await;
        if result.is_ok() {
            metrics.inc_analysis_runs();
            metrics.observe_analysis_duration(timer.elapsed().as_secs_f64());
        }
        result
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Analysis task panicked");
        ApiError::internal("Analysis task failed")
    })??;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "object_detection": outcome.object_detection,
        "classification": outcome.classification,
        "alerts": outcome.alerts,
        "summary": outcome.summary,
    })))
}

/// Aggregated summary over all persisted records for a video
#[utoipa::path(
    get,
    path = "/ai/summary",
    tag = "ai",
    params(("video_id" = String, Query, description = "Video identifier")),
    responses(
        (status = 200, description = "Aggregate view, or {\"summary\": null} with no detections"),
    )
)]
#[get("/summary")]
pub async fn summary(
    state: web::Data<AppState>,
    query: web::Query<SummaryQuery>,
) -> ApiResult<HttpResponse> {
    let view = build_summary_view(state.db.pool(), &query.video_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "summary": view })))
}
