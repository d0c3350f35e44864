//! ABOUTME: Periodic detection simulator for the demo streams
//! ABOUTME: One synthetic detection plus correlated alert per tick, one transaction

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sqlx::SqlitePool;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use vg_core::{Error, Result};
use vg_db::{insert_live_event, BoundingBox, CreateStreamAlertRequest, CreateStreamDetectionRequest};
use vg_obs::Metrics;

const OBJECT_TYPES: [&str; 3] = ["Person", "Vehicle", "Animal"];
const ALERT_LEVELS: [&str; 3] = ["low", "medium", "high"];

/// Generates synthetic live events for the configured demo streams
pub struct Simulator {
    pool: SqlitePool,
    stream_ids: Vec<String>,
    interval: Duration,
    metrics: Arc<Metrics>,
}

impl Simulator {
    pub fn new(
        pool: SqlitePool,
        stream_ids: Vec<String>,
        interval_seconds: u64,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            stream_ids,
            interval: Duration::from_secs(interval_seconds),
            metrics,
        }
    }

    /// Synthesize and persist one detection/alert pair.
    ///
    /// The random source is injected so tests can drive the tick with a
    /// seeded generator.
    pub async fn tick(&self, rng: &mut impl Rng) -> Result<()> {
        let stream_id = self
            .stream_ids
            .choose(rng)
            .ok_or_else(|| Error::Config("Simulator has no streams configured".to_string()))?
            .clone();

        let label = OBJECT_TYPES
            .choose(rng)
            .copied()
            .unwrap_or("Person")
            .to_string();
        let confidence = (rng.gen_range(0.70_f64..=0.98) * 100.0).round() / 100.0;
        let bbox = BoundingBox {
            x: rng.gen_range(50..=300),
            y: rng.gen_range(50..=300),
            width: rng.gen_range(50..=200),
            height: rng.gen_range(50..=200),
        };
        let level = ALERT_LEVELS.choose(rng).copied().unwrap_or("low").to_string();
        let message = format!(
            "{} detected with {}% confidence",
            label,
            (confidence * 100.0) as i64
        );

        insert_live_event(
            &self.pool,
            CreateStreamDetectionRequest {
                stream_id: stream_id.clone(),
                label,
                confidence,
                bbox,
            },
            CreateStreamAlertRequest {
                stream_id: stream_id.clone(),
                message,
                level,
            },
        )
        .await?;

        self.metrics.inc_simulator_ticks();
        debug!(%stream_id, "Simulator tick committed");
        Ok(())
    }

    /// Run ticks at the fixed interval until cancelled.
    ///
    /// A failed tick is logged and the loop continues; the next attempt
    /// happens after the same fixed delay.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            streams = self.stream_ids.len(),
            interval_seconds = self.interval.as_secs(),
            "Starting detection simulator"
        );

        let mut rng = rand::rngs::StdRng::from_entropy();
        let mut ticker = interval(self.interval);
        // the first interval tick fires immediately; skip it so the first
        // event lands one full period after startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Detection simulator stopped");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(&mut rng).await {
                        error!(error = %e, "Simulator tick failed, continuing");
                    }
                }
            }
        }
    }
}
