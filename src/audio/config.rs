use crate::foundation::error::{MergeError, MergeResult};
use crate::media::MediaOpener;
use crate::timeline::clip::Clip;
use tracing::{debug, warn};

/// Sample rate and channel count shared by all audio in a merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

impl AudioConfig {
    /// Configuration used when no clip carries audio.
    pub const DEFAULT: Self = Self {
        sample_rate: 44_100,
        channels: 2,
    };

    /// Create a validated configuration.
    pub fn new(sample_rate: u32, channels: u16) -> MergeResult<Self> {
        let cfg = Self {
            sample_rate,
            channels,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub(crate) fn validate(self) -> MergeResult<()> {
        if self.sample_rate == 0 {
            return Err(MergeError::input("audio sample_rate must be > 0"));
        }
        if self.channels == 0 {
            return Err(MergeError::input("audio channels must be > 0"));
        }
        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Pick the audio configuration for a merge.
///
/// Clips are probed in order; the first one exposing an audio track wins. Clips that fail to open
/// are treated as silent. Each probed input is released before the next one is opened. When no clip
/// has audio, `fallback` is returned.
#[tracing::instrument(skip_all, fields(clips = clips.len()))]
pub fn resolve_audio_config(
    opener: &dyn MediaOpener,
    clips: &[Clip],
    fallback: AudioConfig,
) -> AudioConfig {
    for (i, clip) in clips.iter().enumerate() {
        let input = match opener.open(&clip.source) {
            Ok(input) => input,
            Err(e) => {
                warn!(clip = i, error = %e, "skipping clip while probing audio");
                continue;
            }
        };
        let Some(track) = input.audio_track() else {
            continue;
        };
        let cfg = track.config();
        if cfg.validate().is_err() {
            warn!(clip = i, ?cfg, "ignoring audio track with invalid format");
            continue;
        }
        debug!(clip = i, ?cfg, "resolved audio config");
        return cfg;
    }
    debug!(?fallback, "no clip has audio; using fallback config");
    fallback
}

#[cfg(test)]
#[path = "../../tests/unit/audio/config.rs"]
mod tests;
