//! ABOUTME: Live alert endpoints over the simulator-written records
//! ABOUTME: List newest-first with optional stream filter, plus direct creation

use actix_web::{get, post, web, HttpResponse};
use tracing::info;
use validator::Validate;
use vg_db::{CreateStreamAlertRequest, StreamAlertRepository};

use crate::{
    error::{ApiError, ApiResult},
    models::{CreateAlertRequest, ListAlertsQuery},
    AppState,
};

const MAX_LIMIT: i64 = 500;

/// List live alerts newest-first
#[utoipa::path(
    get,
    path = "/alerts/",
    tag = "alerts",
    params(
        ("stream_id" = Option<String>, Query, description = "Filter by stream"),
        ("limit" = Option<i64>, Query, description = "Row limit, default 5"),
    ),
    responses(
        (status = 200, description = "Live alerts"),
    )
)]
#[get("/")]
pub async fn list_alerts(
    state: web::Data<AppState>,
    query: web::Query<ListAlertsQuery>,
) -> ApiResult<HttpResponse> {
    if query.limit < 1 || query.limit > MAX_LIMIT {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let alerts = StreamAlertRepository::new(state.db.pool())
        .list(query.stream_id.as_deref(), query.limit)
        .await?;

    Ok(HttpResponse::Ok().json(alerts))
}

/// Create a live alert directly
#[utoipa::path(
    post,
    path = "/alerts/",
    tag = "alerts",
    request_body = CreateAlertRequest,
    responses(
        (status = 200, description = "The created alert"),
        (status = 400, description = "Validation failure", body = crate::models::ErrorResponse),
    )
)]
#[post("/")]
pub async fn create_alert(
    state: web::Data<AppState>,
    payload: web::Json<CreateAlertRequest>,
) -> ApiResult<HttpResponse> {
    payload.validate()?;

    let request = payload.into_inner();
    info!(stream_id = %request.stream_id, level = %request.level, "Creating live alert");

    let alert = StreamAlertRepository::new(state.db.pool())
        .create(CreateStreamAlertRequest {
            stream_id: request.stream_id,
            message: request.message,
            level: request.level,
        })
        .await?;

    Ok(HttpResponse::Ok().json(alert))
}
