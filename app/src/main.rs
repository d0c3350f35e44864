//! ABOUTME: Entry point for the vigil video management backend
//! ABOUTME: Starts the API server, observability server, and detection simulator

use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vg_ai::{ModelConfig, ModelRegistry};
use vg_analysis::{Orchestrator, Stages};
use vg_config::Config;
use vg_core::telemetry;
use vg_db::{Db, DbOptions, StreamRepository, UpsertStreamRequest};
use vg_media::{FfmpegOpener, FfmpegSourceConfig};
use vg_obs::ObsState;
use vg_sim::Simulator;
use vg_storage::VideoStorage;
use vg_web::AppState;

#[tokio::main]
async fn main() {
    telemetry::init_tracing("development", "vigil");
    tracing::info!("vigil starting");

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        obs_port = %config.server.obs_port,
        db_path = %config.database.path,
        "Application configured"
    );

    let db_options = DbOptions {
        pool_size: config.database.pool_size,
        sqlite_wal: config.database.sqlite_wal,
    };
    let db = match Db::with_options(&config.database.path, db_options).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = db.health_check().await {
        tracing::error!("Database health check failed: {}", e);
        process::exit(1);
    }

    // demo streams the simulator targets
    let stream_repo = StreamRepository::new(db.pool());
    for demo in &config.simulator.streams {
        if let Err(e) = stream_repo
            .upsert(UpsertStreamRequest {
                id: demo.id.clone(),
                name: demo.name.clone(),
                status: "active".to_string(),
                thumbnail: "/placeholder.svg".to_string(),
                uptime: demo.uptime.clone(),
            })
            .await
        {
            tracing::error!(stream_id = %demo.id, "Failed to seed demo stream: {}", e);
            process::exit(1);
        }
    }

    let storage = match VideoStorage::new(vg_storage::StorageConfig {
        base_dir: Some(PathBuf::from(&config.storage.videos_dir)),
        s3_bucket: std::env::var("AWS_S3_BUCKET").ok(),
        s3_region: std::env::var("AWS_REGION").ok(),
        s3_endpoint: std::env::var("AWS_ENDPOINT_URL").ok(),
        s3_access_key: std::env::var("AWS_ACCESS_KEY_ID").ok(),
        s3_secret_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
    }) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            tracing::error!("Failed to initialize video storage: {}", e);
            process::exit(1);
        }
    };

    let registry = ModelRegistry::from_config(&ModelConfig {
        use_remote: config.ai.use_remote,
        base_url: config.ai.base_url.clone(),
        timeout_seconds: config.ai.timeout_seconds.unwrap_or(30),
    });

    let opener = FfmpegOpener::new(FfmpegSourceConfig {
        ffmpeg_path: config.analysis.ffmpeg_path.clone(),
        ffprobe_path: config.analysis.ffprobe_path.clone(),
        command_timeout: Duration::from_secs(60),
    });
    let stages = Stages::new(Arc::new(opener), registry, config.analysis.clone());
    let orchestrator = Arc::new(Orchestrator::new(db.pool().clone(), stages));

    let obs_state = ObsState::new();

    let cancel = CancellationToken::new();
    let mut simulator_handle = None;
    if config.simulator.enabled {
        let simulator = Simulator::new(
            db.pool().clone(),
            config.simulator.streams.iter().map(|s| s.id.clone()).collect(),
            config.simulator.interval_seconds,
            obs_state.metrics.clone(),
        );
        let sim_cancel = cancel.clone();
        simulator_handle = Some(tokio::spawn(async move {
            simulator.run(sim_cancel).await;
        }));
    }

    let web_state = AppState {
        db: db.clone(),
        orchestrator,
        storage,
        metrics: obs_state.metrics.clone(),
    };

    let web_bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let obs_bind_addr = format!("{}:{}", config.server.host, config.server.obs_port);

    obs_state.readiness.set_ready(true);

    let obs_future = vg_obs::start_server(&obs_bind_addr, obs_state.clone());
    let web_future = vg_web::start_server(&web_bind_addr, web_state);

    let result = tokio::select! {
        obs_result = obs_future => {
            tracing::error!("Observability server exited");
            obs_result
        }
        web_result = web_future => {
            tracing::error!("Web server exited");
            web_result
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    };

    cancel.cancel();
    if let Some(handle) = simulator_handle {
        let _ = handle.await;
    }

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }

    tracing::info!("vigil stopped");
}
