use crate::foundation::error::{MergeError, MergeResult};
use std::path::PathBuf;

// Remainders below this are treated as zero when planning loop passes.
const PLAN_EPS: f64 = 1e-9;

/// One input source plus the duration it should occupy in the output.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    /// Media source handed to the [`crate::MediaOpener`].
    pub source: PathBuf,
    /// Requested output length in seconds, independent of the source's native length.
    pub target_duration: f64,
}

impl Clip {
    /// Create a clip that plays `source` for `target_duration` seconds.
    pub fn new(source: impl Into<PathBuf>, target_duration: f64) -> Self {
        Self {
            source: source.into(),
            target_duration,
        }
    }

    /// Reject non-finite or non-positive target durations.
    pub fn validate(&self, index: usize) -> MergeResult<()> {
        if !self.target_duration.is_finite() || self.target_duration <= 0.0 {
            return Err(MergeError::input(format!(
                "clip {index} ('{}') target_duration must be > 0, got {}",
                self.source.display(),
                self.target_duration
            )));
        }
        Ok(())
    }
}

/// One full or partial playback pass over a clip.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Segment {
    /// Clip index in merge order.
    pub clip_index: usize,
    /// Pass number within the clip, starting at 0.
    pub loop_index: u32,
    /// Start of the pass in source time (relative to the track's first timestamp).
    pub source_start: f64,
    /// End of the pass in source time, exclusive.
    pub source_end: f64,
    /// Start of the pass on the global output timeline.
    pub output_offset: f64,
}

impl Segment {
    /// Length of the pass in seconds.
    pub fn duration(&self) -> f64 {
        self.source_end - self.source_start
    }

    /// End of the pass on the global output timeline, exclusive.
    pub fn output_end(&self) -> f64 {
        self.output_offset + self.duration()
    }
}

/// Ordered playback passes for one clip.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ClipPlan {
    /// Clip index in merge order.
    pub clip_index: usize,
    /// Length of the source in seconds.
    pub native_duration: f64,
    /// Requested output length in seconds.
    pub target_duration: f64,
    /// Passes in playback order.
    pub segments: Vec<Segment>,
}

/// Split `target_duration` into passes over a source of `native_duration`.
///
/// Every pass restarts at the source's beginning. All passes are full except possibly the last,
/// which is truncated to the remainder; pass durations sum to `target_duration`.
pub fn plan_clip(
    clip_index: usize,
    native_duration: f64,
    target_duration: f64,
    output_offset: f64,
) -> MergeResult<ClipPlan> {
    if !native_duration.is_finite() || native_duration <= 0.0 {
        return Err(MergeError::input(format!(
            "clip {clip_index} has zero native duration and cannot be looped"
        )));
    }
    if !target_duration.is_finite() || target_duration <= 0.0 {
        return Err(MergeError::input(format!(
            "clip {clip_index} target_duration must be > 0, got {target_duration}"
        )));
    }

    let mut segments = Vec::new();
    let mut loop_index = 0u32;
    loop {
        let start = f64::from(loop_index) * native_duration;
        let remaining = target_duration - start;
        // A positive target always gets its first pass, however short.
        if remaining <= PLAN_EPS && loop_index > 0 {
            break;
        }
        let len = native_duration.min(remaining);
        segments.push(Segment {
            clip_index,
            loop_index,
            source_start: 0.0,
            source_end: len,
            output_offset: output_offset + start,
        });
        loop_index += 1;
    }

    Ok(ClipPlan {
        clip_index,
        native_duration,
        target_duration,
        segments,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clip.rs"]
mod tests;
