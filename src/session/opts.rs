use crate::audio::config::AudioConfig;
use crate::audio::normalize::DEFAULT_SILENCE_CHUNK_SECS;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{MergeError, MergeResult};
use crate::render::surface::{FitMode, ScaleFilter};

/// Options for one merge.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeOpts {
    /// Output frame size. Defaults to the first clip's native frame size.
    pub canvas: Option<Canvas>,
    /// Nominal output frame rate, used by constant-rate sinks.
    pub fps: Fps,
    /// How source frames are placed on the canvas.
    pub fit: FitMode,
    /// Canvas colour behind letterboxed frames, straight RGBA.
    pub background_rgba: [u8; 4],
    /// Filter used when a frame has to be scaled.
    pub scale_filter: ScaleFilter,
    /// Audio format used when no clip has an audio track.
    pub default_audio: AudioConfig,
    /// Upper bound for one generated silence buffer, seconds.
    pub silence_chunk_secs: f64,
}

impl Default for MergeOpts {
    fn default() -> Self {
        Self {
            canvas: None,
            fps: Fps::default(),
            fit: FitMode::default(),
            background_rgba: [0, 0, 0, 255],
            scale_filter: ScaleFilter::default(),
            default_audio: AudioConfig::DEFAULT,
            silence_chunk_secs: DEFAULT_SILENCE_CHUNK_SECS,
        }
    }
}

impl MergeOpts {
    /// Reject options that cannot produce an output.
    pub fn validate(&self) -> MergeResult<()> {
        if let Some(canvas) = self.canvas {
            canvas.validate()?;
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(MergeError::input(format!(
                "fps must be positive, got {}/{}",
                self.fps.num, self.fps.den
            )));
        }
        self.default_audio.validate()?;
        if !self.silence_chunk_secs.is_finite() || self.silence_chunk_secs <= 0.0 {
            return Err(MergeError::input(format!(
                "silence_chunk_secs must be > 0, got {}",
                self.silence_chunk_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
