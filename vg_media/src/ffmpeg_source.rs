//! ABOUTME: FFmpeg-backed frame source for files and URLs
//! ABOUTME: Probes the frame count with ffprobe, extracts frames as JPEG

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use vg_core::{Error, Result};

use crate::proc::{run, CommandSpec};
use crate::{Frame, FrameSource, SourceOpener};

/// Configuration for the ffmpeg-backed source
#[derive(Debug, Clone)]
pub struct FfmpegSourceConfig {
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Timeout applied to each probe and frame extraction
    pub command_timeout: Duration,
}

impl Default for FfmpegSourceConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            command_timeout: Duration::from_secs(60),
        }
    }
}

/// Opens video locators through ffprobe/ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    config: FfmpegSourceConfig,
}

impl FfmpegOpener {
    pub fn new(config: FfmpegSourceConfig) -> Self {
        Self { config }
    }

    /// Count video packets in the first video stream
    #[instrument(skip(self))]
    async fn probe_frame_count(&self, locator: &str) -> Result<u64> {
        let spec = CommandSpec::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_packets",
                "-show_entries",
                "stream=nb_read_packets",
                "-of",
                "default=nokey=1:noprint_wrappers=1",
                locator,
            ])
            .timeout(self.config.command_timeout);

        let output = run(spec)
            .await
            .map_err(|e| Error::Source(format!("ffprobe failed for {}: {}", locator, e)))?;

        if !output.success {
            return Err(Error::Source(format!(
                "ffprobe failed for {}: {}",
                locator,
                output.stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let count: u64 = text
            .trim()
            .parse()
            .map_err(|_| Error::Source(format!("ffprobe returned no frame count for {}", locator)))?;

        debug!(locator = %locator, frames = count, "Probed video");
        Ok(count)
    }
}

#[async_trait]
impl SourceOpener for FfmpegOpener {
    async fn open(&self, locator: &str) -> Result<Box<dyn FrameSource>> {
        let total = self.probe_frame_count(locator).await?;
        if total == 0 {
            return Err(Error::Source(format!("{} contains no frames", locator)));
        }

        Ok(Box::new(FfmpegSource {
            locator: locator.to_string(),
            total,
            config: self.config.clone(),
        }))
    }
}

/// A probed video readable frame-by-frame via ffmpeg
struct FfmpegSource {
    locator: String,
    total: u64,
    config: FfmpegSourceConfig,
}

#[async_trait]
impl FrameSource for FfmpegSource {
    fn frame_count(&self) -> u64 {
        self.total
    }

    async fn read_frame(&self, index: u64) -> Result<Frame> {
        if index >= self.total {
            return Err(Error::Validation(format!(
                "frame {} out of range ({} frames)",
                index, self.total
            )));
        }

        let select = format!("select=eq(n\\,{})", index);
        let spec = CommandSpec::new(&self.config.ffmpeg_path)
            .args([
                "-v",
                "error",
                "-i",
                &self.locator,
                "-vf",
                &select,
                "-vsync",
                "0",
                "-frames:v",
                "1",
                "-f",
                "image2pipe",
                "-c:v",
                "mjpeg",
                "pipe:1",
            ])
            .timeout(self.config.command_timeout);

        let output = run(spec)
            .await
            .map_err(|e| Error::Source(format!("ffmpeg failed for {}: {}", self.locator, e)))?;

        if !output.success || output.stdout.is_empty() {
            return Err(Error::Source(format!(
                "ffmpeg produced no frame {} for {}: {}",
                index,
                self.locator,
                output.stderr.trim()
            )));
        }

        Ok(Frame {
            index,
            data: output.stdout,
        })
    }
}
