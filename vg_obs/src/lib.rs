//! ABOUTME: Observability endpoints for liveness, readiness, and metrics
//! ABOUTME: Runs on its own port, separate from the API surface

use actix_web::{
    dev::{ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, HttpResponse, HttpServer, Result as ActixResult,
};
use prometheus_client::{
    encoding::text::encode,
    metrics::{counter::Counter, histogram::Histogram},
    registry::Registry,
};
use serde_json::json;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use vg_core::Result;

/// Readiness gate toggled by the application once startup completes
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    ready: Arc<AtomicBool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Prometheus registry with the service-level counters
#[derive(Debug)]
pub struct Metrics {
    registry: Arc<Mutex<Registry>>,
    http_requests_total: Counter,
    analysis_runs_total: Counter,
    simulator_ticks_total: Counter,
    analysis_run_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_requests_total = Counter::default();
        registry.register(
            "http_requests_total",
            "Total number of HTTP requests",
            http_requests_total.clone(),
        );

        let analysis_runs_total = Counter::default();
        registry.register(
            "analysis_runs_total",
            "Total number of committed analysis runs",
            analysis_runs_total.clone(),
        );

        let simulator_ticks_total = Counter::default();
        registry.register(
            "simulator_ticks_total",
            "Total number of successful simulator ticks",
            simulator_ticks_total.clone(),
        );

        // analysis runs take seconds with real models
        let analysis_run_duration_seconds =
            Histogram::new([0.5, 1.0, 2.5, 5.0, 10.0, 30.0].into_iter());
        registry.register(
            "analysis_run_duration_seconds",
            "Wall-clock duration of analysis runs in seconds",
            analysis_run_duration_seconds.clone(),
        );

        Self {
            registry: Arc::new(Mutex::new(registry)),
            http_requests_total,
            analysis_runs_total,
            simulator_ticks_total,
            analysis_run_duration_seconds,
        }
    }

    pub fn inc_requests(&self) {
        self.http_requests_total.inc();
    }

    pub fn inc_analysis_runs(&self) {
        self.analysis_runs_total.inc();
    }

    pub fn inc_simulator_ticks(&self) {
        self.simulator_ticks_total.inc();
    }

    pub fn observe_analysis_duration(&self, duration: f64) {
        self.analysis_run_duration_seconds.observe(duration);
    }

    pub fn http_requests(&self) -> u64 {
        self.http_requests_total.get()
    }

    pub fn analysis_runs(&self) -> u64 {
        self.analysis_runs_total.get()
    }

    pub fn simulator_ticks(&self) -> u64 {
        self.simulator_ticks_total.get()
    }

    pub fn encode(&self) -> Result<String> {
        let registry = self.registry.lock().map_err(|e| {
            vg_core::Error::Config(format!("Failed to lock metrics registry: {}", e))
        })?;

        let mut buffer = String::new();
        encode(&mut buffer, &registry)
            .map_err(|e| vg_core::Error::Config(format!("Failed to encode metrics: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared state for the observability endpoints
#[derive(Debug, Clone)]
pub struct ObsState {
    pub readiness: ReadinessGate,
    pub metrics: Arc<Metrics>,
}

impl ObsState {
    pub fn new() -> Self {
        Self {
            readiness: ReadinessGate::new(),
            metrics: Arc::new(Metrics::new()),
        }
    }
}

impl Default for ObsState {
    fn default() -> Self {
        Self::new()
    }
}

async fn health() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok"
    })))
}

async fn readiness(state: web::Data<ObsState>) -> ActixResult<HttpResponse> {
    if state.readiness.is_ready() {
        Ok(HttpResponse::Ok().json(json!({
            "status": "ready"
        })))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(json!({
            "status": "not ready"
        })))
    }
}

async fn metrics(state: web::Data<ObsState>) -> ActixResult<HttpResponse> {
    // the scrape itself does not count toward http_requests_total
    match state.metrics.encode() {
        Ok(metrics_text) => Ok(HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4; charset=utf-8")
            .body(metrics_text)),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            Ok(HttpResponse::InternalServerError().json(json!({
                "error": "Failed to encode metrics"
            })))
        }
    }
}

/// Create observability service factory
pub fn create_service(
    state: ObsState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(Logger::default())
        .service(
            web::scope("")
                .route("/healthz", web::get().to(health))
                .route("/readyz", web::get().to(readiness))
                .route("/metrics", web::get().to(metrics)),
        )
}

/// Start the observability server
pub async fn start_server(bind_addr: &str, state: ObsState) -> Result<()> {
    tracing::info!("Starting observability server on {}", bind_addr);

    HttpServer::new(move || create_service(state.clone()))
        .bind(bind_addr)
        .map_err(|e| vg_core::Error::Config(format!("Failed to bind server: {}", e)))?
        .run()
        .await
        .map_err(|e| vg_core::Error::Config(format!("Server error: {}", e)))?;

    Ok(())
}
