//! ABOUTME: REST API layer wiring routes, state, and OpenAPI documentation
//! ABOUTME: Serves the video, stream, detection, alert, and analysis endpoints

use std::sync::Arc;

use actix_web::dev::Service as _;
use actix_web::{web, App, HttpResponse, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use vg_analysis::Orchestrator;
use vg_core::Result;
use vg_db::Db;
use vg_obs::Metrics;
use vg_storage::VideoStorage;

pub mod error;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

use routes::{ai, alerts, detections, streams, videos};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub orchestrator: Arc<Orchestrator>,
    pub storage: Arc<VideoStorage>,
    pub metrics: Arc<Metrics>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        ai::analyze,
        ai::summary,
        videos::save_metadata,
        videos::list_videos,
        videos::delete_video,
        streams::list_streams,
        streams::get_stream,
        detections::list_detections,
        detections::create_detection,
        alerts::list_alerts,
        alerts::create_alert,
    ),
    components(
        schemas(
            models::AnalyzeRequest,
            models::VideoMetadataRequest,
            models::StreamView,
            models::DetectionView,
            models::CreateDetectionRequest,
            models::CreateAlertRequest,
            models::ErrorResponse,
        ),
    ),
    tags(
        (name = "ai", description = "Video analysis endpoints"),
        (name = "videos", description = "Video reference management"),
        (name = "streams", description = "Live stream listing"),
        (name = "detections", description = "Live detection records"),
        (name = "alerts", description = "Live alert records"),
    )
)]
pub struct ApiDoc;

async fn root() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Video Management Backend is running"
    }))
}

/// Create the main web application service factory
pub fn create_app(
    state: AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let metrics = state.metrics.clone();
    App::new()
        .app_data(web::Data::new(state))
        .wrap_fn(move |req, srv| {
            metrics.inc_requests();
            srv.call(req)
        })
        .wrap(actix_web::middleware::Logger::default())
        .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", web::get().to(root))
        .service(web::scope("/ai").service(ai::analyze).service(ai::summary))
        .service(
            web::scope("/videos")
                .service(videos::save_metadata)
                .service(videos::list_videos)
                .service(videos::delete_video),
        )
        .service(
            web::scope("/streams")
                .service(streams::list_streams)
                .service(streams::get_stream),
        )
        .service(
            web::scope("/detections")
                .service(detections::list_detections)
                .service(detections::create_detection),
        )
        .service(
            web::scope("/alerts")
                .service(alerts::list_alerts)
                .service(alerts::create_alert),
        )
}

/// Start the web server
pub async fn start_server(bind_addr: &str, state: AppState) -> Result<()> {
    tracing::info!("Starting web server on {}", bind_addr);

    HttpServer::new(move || create_app(state.clone()))
        .bind(bind_addr)
        .map_err(|e| vg_core::Error::Config(format!("Failed to bind web server: {}", e)))?
        .run()
        .await
        .map_err(|e| vg_core::Error::Config(format!("Web server error: {}", e)))?;

    Ok(())
}
