//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles all application settings from environment variables and files

use config::{Config as ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use validator::Validate;
use vg_core::{Error, Result};

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub database: DatabaseConfig,
    #[validate(nested)]
    pub storage: StorageConfig,
    #[validate(nested)]
    pub analysis: AnalysisConfig,
    #[validate(nested)]
    pub simulator: SimulatorConfig,
    pub ai: AiBackendConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[validate(range(min = 1, max = 65535))]
    pub obs_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            obs_port: 9000,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub path: String,
    #[validate(range(min = 1, max = 100))]
    pub pool_size: u32,
    pub sqlite_wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "vigil.db".to_string(),
            pool_size: 10,
            sqlite_wal: true,
        }
    }
}

/// Storage configuration for uploaded video files
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct StorageConfig {
    /// Local filesystem directory for uploaded videos
    pub videos_dir: String,
    /// Object store URL for S3-compatible storage (overrides videos_dir)
    #[validate(url)]
    pub object_store_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            videos_dir: "./data/videos".to_string(),
            object_store_url: None,
        }
    }
}

/// Analysis pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AnalysisConfig {
    /// Raw-frame stride for the detection stage
    #[validate(range(min = 1, max = 3600))]
    pub detection_stride: u64,
    /// Sample count for the classification stage
    #[validate(range(min = 1, max = 256))]
    pub classification_frame_count: usize,
    /// Sample count for the summarization stage
    #[validate(range(min = 1, max = 64))]
    pub summary_frame_count: usize,
    /// Minimum confidence for a hazard score to become an alert record
    #[validate(range(min = 0.0, max = 1.0))]
    pub alert_threshold: f64,
    /// Path to the ffmpeg binary
    #[validate(length(min = 1))]
    pub ffmpeg_path: String,
    /// Path to the ffprobe binary
    #[validate(length(min = 1))]
    pub ffprobe_path: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detection_stride: 30,
            classification_frame_count: 16,
            summary_frame_count: 5,
            alert_threshold: 0.5,
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

/// Detection simulator configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct SimulatorConfig {
    pub enabled: bool,
    /// Delay between simulator ticks in seconds
    #[validate(range(min = 1, max = 3600))]
    pub interval_seconds: u64,
    /// Demo streams seeded at startup and targeted by the simulator
    pub streams: Vec<DemoStream>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 10,
            streams: vec![
                DemoStream {
                    id: "stream-001".to_string(),
                    name: "Main Entrance".to_string(),
                    uptime: "99.2%".to_string(),
                },
                DemoStream {
                    id: "stream-002".to_string(),
                    name: "Home".to_string(),
                    uptime: "98.7%".to_string(),
                },
            ],
        }
    }
}

/// A seeded demo stream
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoStream {
    pub id: String,
    pub name: String,
    pub uptime: String,
}

/// Model backend selection
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AiBackendConfig {
    /// Use remote inference services instead of the deterministic stubs
    pub use_remote: bool,
    /// Base URL for the remote inference gateway
    pub base_url: Option<String>,
    /// Request timeout in seconds for remote backends
    pub timeout_seconds: Option<u64>,
}

impl Config {
    /// Load configuration from defaults, `vigil.toml`, and `VIGIL_*` env vars
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.obs_port", 9000)?
            .set_default("database.path", "vigil.db")?
            .set_default("database.pool_size", 10)?
            .set_default("database.sqlite_wal", true)?
            .set_default("storage.videos_dir", "./data/videos")?
            .set_default("analysis.detection_stride", 30)?
            .set_default("analysis.classification_frame_count", 16)?
            .set_default("analysis.summary_frame_count", 5)?
            .set_default("analysis.alert_threshold", 0.5)?
            .set_default("analysis.ffmpeg_path", "ffmpeg")?
            .set_default("analysis.ffprobe_path", "ffprobe")?
            .set_default("simulator.enabled", true)?
            .set_default("simulator.interval_seconds", 10)?
            .set_default("ai.use_remote", false)?;

        // Optional config file
        builder = builder.add_source(File::with_name("vigil").required(false));

        // Multi-word keys clash with the underscore separator below
        // (VIGIL_DATABASE_POOL_SIZE would parse as database.pool.size),
        // so they get explicit overrides
        const NESTED_ENV_KEYS: [(&str, &str); 15] = [
            ("VIGIL_SERVER_OBS_PORT", "server.obs_port"),
            ("VIGIL_DATABASE_POOL_SIZE", "database.pool_size"),
            ("VIGIL_DATABASE_SQLITE_WAL", "database.sqlite_wal"),
            ("VIGIL_STORAGE_VIDEOS_DIR", "storage.videos_dir"),
            ("VIGIL_STORAGE_OBJECT_STORE_URL", "storage.object_store_url"),
            ("VIGIL_ANALYSIS_DETECTION_STRIDE", "analysis.detection_stride"),
            (
                "VIGIL_ANALYSIS_CLASSIFICATION_FRAME_COUNT",
                "analysis.classification_frame_count",
            ),
            (
                "VIGIL_ANALYSIS_SUMMARY_FRAME_COUNT",
                "analysis.summary_frame_count",
            ),
            ("VIGIL_ANALYSIS_ALERT_THRESHOLD", "analysis.alert_threshold"),
            ("VIGIL_ANALYSIS_FFMPEG_PATH", "analysis.ffmpeg_path"),
            ("VIGIL_ANALYSIS_FFPROBE_PATH", "analysis.ffprobe_path"),
            (
                "VIGIL_SIMULATOR_INTERVAL_SECONDS",
                "simulator.interval_seconds",
            ),
            ("VIGIL_AI_USE_REMOTE", "ai.use_remote"),
            ("VIGIL_AI_BASE_URL", "ai.base_url"),
            ("VIGIL_AI_TIMEOUT_SECONDS", "ai.timeout_seconds"),
        ];
        for (var, key) in NESTED_ENV_KEYS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // Environment overrides for the single-word keys,
        // e.g. VIGIL_SERVER_PORT=8081
        builder = builder.add_source(
            Environment::with_prefix("VIGIL")
                .separator("_")
                .try_parsing(true),
        );

        let config: Config = builder
            .build()?
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))?;

        config
            .validate()
            .map_err(|e| Error::Config(format!("Configuration validation failed: {}", e)))?;

        Ok(config)
    }
}
