//! ABOUTME: In-memory frame source for deterministic tests
//! ABOUTME: No decoding, no processes; frames are whatever bytes you seed

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use vg_core::{Error, Result};

use crate::{Frame, FrameSource, SourceOpener};

/// A fully in-memory video
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: Vec<Bytes>,
    /// Raw indices whose reads fail, for exercising skip paths
    failing: Vec<u64>,
}

impl MemorySource {
    /// Build a source of `count` synthetic frames; frame k carries k+1 bytes
    /// so stub backends keyed off frame size behave deterministically.
    pub fn synthetic(count: usize) -> Self {
        let frames = (0..count)
            .map(|k| Bytes::from(vec![0u8; k + 1]))
            .collect();
        Self {
            frames,
            failing: Vec::new(),
        }
    }

    pub fn from_frames(frames: Vec<Bytes>) -> Self {
        Self {
            frames,
            failing: Vec::new(),
        }
    }

    /// Make reads of the given raw indices fail
    pub fn with_failing_indices(mut self, failing: Vec<u64>) -> Self {
        self.failing = failing;
        self
    }
}

#[async_trait]
impl FrameSource for MemorySource {
    fn frame_count(&self) -> u64 {
        self.frames.len() as u64
    }

    async fn read_frame(&self, index: u64) -> Result<Frame> {
        if self.failing.contains(&index) {
            return Err(Error::Source(format!("injected failure at frame {}", index)));
        }
        let data = self
            .frames
            .get(index as usize)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("frame {} out of range", index)))?;
        Ok(Frame { index, data })
    }
}

/// Opener that serves registered in-memory videos by locator
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    sources: HashMap<String, Arc<MemorySource>>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, locator: impl Into<String>, source: MemorySource) -> Self {
        self.sources.insert(locator.into(), Arc::new(source));
        self
    }
}

#[async_trait]
impl SourceOpener for MemoryOpener {
    async fn open(&self, locator: &str) -> Result<Box<dyn FrameSource>> {
        let source = self
            .sources
            .get(locator)
            .ok_or_else(|| Error::Source(format!("cannot open {}", locator)))?;
        if source.frame_count() == 0 {
            return Err(Error::Source(format!("{} contains no frames", locator)));
        }
        Ok(Box::new(MemorySourceHandle {
            source: Arc::clone(source),
        }))
    }
}

struct MemorySourceHandle {
    source: Arc<MemorySource>,
}

#[async_trait]
impl FrameSource for MemorySourceHandle {
    fn frame_count(&self) -> u64 {
        self.source.frame_count()
    }

    async fn read_frame(&self, index: u64) -> Result<Frame> {
        self.source.read_frame(index).await
    }
}
