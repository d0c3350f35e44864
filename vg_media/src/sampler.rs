//! ABOUTME: Deterministic frame-index sampling, by count and by stride
//! ABOUTME: Pure integer math so every caller gets identical indices

use vg_core::{Error, Result};

/// Pick exactly `count` evenly spaced frame indices across `total_frames`.
///
/// The first index is always 0 and the last is always `total_frames - 1`;
/// interior indices use ceiling interpolation, so `(100, 5)` yields
/// `[0, 25, 50, 75, 99]`. Indices are strictly ascending whenever
/// `count <= total_frames`.
pub fn sample_by_count(total_frames: u64, count: usize) -> Result<Vec<u64>> {
    if total_frames == 0 {
        return Err(Error::Source("video has no frames".to_string()));
    }
    if count == 0 {
        return Err(Error::Validation("sample count must be positive".to_string()));
    }
    if count as u64 > total_frames {
        return Err(Error::Validation(format!(
            "cannot sample {} frames from a {}-frame video",
            count, total_frames
        )));
    }
    if count == 1 {
        return Ok(vec![0]);
    }

    let span = total_frames - 1;
    let gaps = (count - 1) as u64;
    Ok((0..count as u64).map(|k| (k * span).div_ceil(gaps)).collect())
}

/// Pick every `stride`-th raw frame index: 0, stride, 2*stride, ...
pub fn sample_by_stride(total_frames: u64, stride: u64) -> Result<Vec<u64>> {
    if stride == 0 {
        return Err(Error::Validation("stride must be positive".to_string()));
    }
    Ok((0..total_frames).step_by(stride as usize).collect())
}
