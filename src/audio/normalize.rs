use crate::audio::config::AudioConfig;
use crate::audio::resample::{LinearResampler, Resampler, remix_interleaved};
use crate::foundation::core::secs_to_samples_round;
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::AudioBuffer;

/// Default upper bound for one generated silence buffer, in seconds.
pub const DEFAULT_SILENCE_CHUNK_SECS: f64 = 1.0;

/// Brings decoded audio to one target [`AudioConfig`].
pub struct AudioNormalizer {
    target: AudioConfig,
    resampler: Box<dyn Resampler>,
    silence_chunk_frames: u64,
}

impl AudioNormalizer {
    /// Normalizer backed by the software [`LinearResampler`].
    pub fn new(target: AudioConfig) -> Self {
        Self::with_resampler(target, Box::new(LinearResampler::new()))
    }

    /// Normalizer backed by a caller-supplied resampler.
    pub fn with_resampler(target: AudioConfig, resampler: Box<dyn Resampler>) -> Self {
        Self {
            target,
            resampler,
            silence_chunk_frames: chunk_frames(target, DEFAULT_SILENCE_CHUNK_SECS),
        }
    }

    /// Bound generated silence buffers to `secs` seconds each.
    pub fn with_silence_chunk_secs(mut self, secs: f64) -> Self {
        self.silence_chunk_frames = chunk_frames(self.target, secs);
        self
    }

    /// Format every output buffer is converted to.
    pub fn target(&self) -> AudioConfig {
        self.target
    }

    /// Start a new contiguous stream; resampler state from earlier buffers is dropped.
    pub fn reset(&mut self) {
        self.resampler.reset();
    }

    /// Return `buf` converted to the target configuration.
    ///
    /// Buffers already in the target format are returned unchanged. Otherwise channels are
    /// remixed and the rate converted; the result spans the same duration to within one sample.
    pub fn normalize(&mut self, buf: AudioBuffer) -> MergeResult<AudioBuffer> {
        buf.validate()?;
        if buf.config() == self.target {
            return Ok(buf);
        }

        let remixed = if buf.channels == self.target.channels {
            buf.interleaved
        } else {
            remix_interleaved(&buf.interleaved, buf.channels, self.target.channels)?
        };
        let resampled = self.resampler.process(
            &remixed,
            self.target.channels,
            buf.sample_rate,
            self.target.sample_rate,
        )?;

        let out = AudioBuffer {
            sample_rate: self.target.sample_rate,
            channels: self.target.channels,
            interleaved: resampled,
        };
        if out.validate().is_err() {
            return Err(MergeError::resample(format!(
                "resampler produced {} samples, not a whole number of {}-channel frames",
                out.interleaved.len(),
                out.channels
            )));
        }
        Ok(out)
    }

    /// Silence spanning `duration` seconds in the target configuration, chunked.
    pub fn silence(&self, duration: f64) -> SilenceChunks {
        self.silence_frames(secs_to_samples_round(duration, self.target.sample_rate))
    }

    /// Exactly `frames` sample frames of silence in the target configuration, chunked.
    pub fn silence_frames(&self, frames: u64) -> SilenceChunks {
        SilenceChunks {
            config: self.target,
            remaining: frames,
            chunk_frames: self.silence_chunk_frames,
        }
    }
}

fn chunk_frames(target: AudioConfig, secs: f64) -> u64 {
    secs_to_samples_round(secs, target.sample_rate).max(1)
}

/// Iterator over bounded zero-filled buffers.
#[derive(Clone, Debug)]
pub struct SilenceChunks {
    config: AudioConfig,
    remaining: u64,
    chunk_frames: u64,
}

impl SilenceChunks {
    /// Sample frames not yet yielded.
    pub fn remaining_frames(&self) -> u64 {
        self.remaining
    }
}

impl Iterator for SilenceChunks {
    type Item = AudioBuffer;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let n = self.remaining.min(self.chunk_frames);
        self.remaining -= n;
        Some(AudioBuffer::silent(self.config, n as usize))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/normalize.rs"]
mod tests;
