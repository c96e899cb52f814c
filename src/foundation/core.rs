use crate::foundation::error::{MergeError, MergeResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> MergeResult<Self> {
        if den == 0 {
            return Err(MergeError::input("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(MergeError::input("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas; both dimensions must be positive.
    pub fn new(width: u32, height: u32) -> MergeResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    /// Reject zero-sized canvases.
    pub fn validate(self) -> MergeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MergeError::input(format!(
                "output dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Byte length of one tightly packed RGBA8 frame.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Nearest whole sample count for `secs` at `sample_rate`.
pub(crate) fn secs_to_samples_round(secs: f64, sample_rate: u32) -> u64 {
    (secs * f64::from(sample_rate)).round().max(0.0) as u64
}

/// Seconds spanned by `samples` at `sample_rate`.
pub(crate) fn samples_to_secs(samples: u64, sample_rate: u32) -> f64 {
    (samples as f64) / f64::from(sample_rate)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
