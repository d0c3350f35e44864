//! ABOUTME: Frame sampling and video frame sources
//! ABOUTME: Trait-based sources so the pipeline never touches ffmpeg directly

use async_trait::async_trait;
use bytes::Bytes;
use vg_core::Result;

pub mod ffmpeg_source;
pub mod memory_source;
pub mod proc;
pub mod sampler;

pub use ffmpeg_source::{FfmpegOpener, FfmpegSourceConfig};
pub use memory_source::{MemoryOpener, MemorySource};
pub use sampler::{sample_by_count, sample_by_stride};

/// One decoded frame of a video
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw frame number within the source
    pub index: u64,
    /// Encoded image bytes (JPEG for the ffmpeg source)
    pub data: Bytes,
}

/// A video opened for frame-level access
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Total number of raw frames in the source
    fn frame_count(&self) -> u64;

    /// Read one frame by raw frame number
    async fn read_frame(&self, index: u64) -> Result<Frame>;
}

/// Opens a video locator (path or URL) into a FrameSource.
///
/// Fails with `Error::Source` when the locator cannot be opened or the
/// video has zero frames.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, locator: &str) -> Result<Box<dyn FrameSource>>;
}

/// Read the frames at the given raw indices, in order
pub async fn collect_frames(source: &dyn FrameSource, indices: &[u64]) -> Result<Vec<Frame>> {
    let mut frames = Vec::with_capacity(indices.len());
    for &index in indices {
        frames.push(source.read_frame(index).await?);
    }
    Ok(frames)
}
