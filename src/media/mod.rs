//! Boundary to the media library that demuxes and decodes clip sources.
//!
//! The merge engine never touches containers or codecs itself. It opens each clip through a
//! [`MediaOpener`], reads track metadata, and pulls decoded samples for one time range at a time.

/// `ffprobe`/`ffmpeg` backed decoder.
pub mod ffmpeg;
/// Deterministic in-memory sources for tests and demos.
pub mod synthetic;

use crate::audio::config::AudioConfig;
use crate::foundation::error::{MergeError, MergeResult};
use std::path::Path;

/// A decoded video frame, tightly packed straight-alpha RGBA8, row-major.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    /// Presentation time in the source's own timeline, seconds.
    pub timestamp: f64,
    /// Display duration, seconds.
    pub duration: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes.
    pub data: Vec<u8>,
}

/// Decoded interleaved floating-point PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved `f32` samples, `frames * channels` long.
    pub interleaved: Vec<f32>,
}

impl AudioBuffer {
    /// Create a validated buffer.
    pub fn new(sample_rate: u32, channels: u16, interleaved: Vec<f32>) -> MergeResult<Self> {
        let buf = Self {
            sample_rate,
            channels,
            interleaved,
        };
        buf.validate()?;
        Ok(buf)
    }

    /// A zero-filled buffer of `frames` sample frames.
    pub fn silent(config: AudioConfig, frames: usize) -> Self {
        Self {
            sample_rate: config.sample_rate,
            channels: config.channels,
            interleaved: vec![0.0; frames * usize::from(config.channels)],
        }
    }

    pub(crate) fn validate(&self) -> MergeResult<()> {
        if self.sample_rate == 0 || self.channels == 0 {
            return Err(MergeError::resample(format!(
                "audio buffer has invalid format {} Hz / {} ch",
                self.sample_rate, self.channels
            )));
        }
        if !self
            .interleaved
            .len()
            .is_multiple_of(usize::from(self.channels))
        {
            return Err(MergeError::resample(format!(
                "audio buffer length {} is not a multiple of {} channels",
                self.interleaved.len(),
                self.channels
            )));
        }
        Ok(())
    }

    /// Sample rate and channel count of this buffer.
    pub fn config(&self) -> AudioConfig {
        AudioConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved.len() / usize::from(self.channels)
    }

    /// Return `true` when the buffer holds no sample frames.
    pub fn is_empty(&self) -> bool {
        self.interleaved.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        (self.frames() as f64) / f64::from(self.sample_rate)
    }

    /// Iterate over the samples of one channel.
    pub fn channel(&self, ch: u16) -> impl Iterator<Item = f32> + '_ {
        let stride = usize::from(self.channels.max(1));
        self.interleaved
            .iter()
            .skip(usize::from(ch))
            .step_by(stride)
            .copied()
    }

    /// Keep only the first `frames` sample frames.
    pub fn truncate_frames(&mut self, frames: usize) {
        self.interleaved
            .truncate(frames * usize::from(self.channels));
    }
}

/// Metadata of the primary video track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoTrackInfo {
    /// Native frame width.
    pub width: u32,
    /// Native frame height.
    pub height: u32,
    /// Timestamp of the first decodable frame, seconds.
    pub first_timestamp: f64,
}

/// Metadata of the primary audio track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioTrackInfo {
    /// Native sample rate in Hz.
    pub sample_rate: u32,
    /// Native channel count.
    pub channels: u16,
    /// Timestamp of the first decodable sample, seconds.
    pub first_timestamp: f64,
}

impl AudioTrackInfo {
    /// Native configuration of the track.
    pub fn config(&self) -> AudioConfig {
        AudioConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

/// Lazily decoded video frames in increasing timestamp order.
pub type VideoFrames<'a> = Box<dyn Iterator<Item = MergeResult<VideoFrame>> + 'a>;

/// Lazily decoded audio buffers in increasing time order.
pub type AudioBuffers<'a> = Box<dyn Iterator<Item = MergeResult<AudioBuffer>> + 'a>;

/// One opened clip source.
///
/// Dropping the input releases every decode resource it holds. Producers returned by
/// `video_frames`/`audio_buffers` borrow the input and are closed when dropped.
pub trait MediaInput {
    /// Primary video track, if any.
    fn video_track(&self) -> Option<VideoTrackInfo>;

    /// Primary audio track, if any.
    fn audio_track(&self) -> Option<AudioTrackInfo>;

    /// Decoded length of the source in seconds.
    fn duration(&self) -> f64;

    /// Decoded video frames with `start <= timestamp < end` (source timeline).
    fn video_frames(&mut self, start: f64, end: f64) -> MergeResult<VideoFrames<'_>>;

    /// Decoded audio covering `[start, end)` (source timeline).
    fn audio_buffers(&mut self, start: f64, end: f64) -> MergeResult<AudioBuffers<'_>>;
}

/// Opens clip sources.
pub trait MediaOpener {
    /// Open `source` for decoding.
    fn open(&self, source: &Path) -> MergeResult<Box<dyn MediaInput>>;
}

impl<T: MediaOpener + ?Sized> MediaOpener for &T {
    fn open(&self, source: &Path) -> MergeResult<Box<dyn MediaInput>> {
        (**self).open(source)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/buffer.rs"]
mod tests;
