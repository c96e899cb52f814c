use crate::audio::config::AudioConfig;
use crate::foundation::core::Fps;
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::{
    AudioBuffer, AudioBuffers, AudioTrackInfo, MediaInput, MediaOpener, VideoFrame, VideoFrames,
    VideoTrackInfo,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const TIME_EPS: f64 = 1e-9;

/// Description of one synthetic source.
///
/// Frame `i` sits at `first_timestamp + i / fps` and every pixel encodes `i` (see
/// [`source_frame_index`]), so callers can tell which source frame ended up where.
#[derive(Clone, Debug)]
pub struct SyntheticSource {
    /// Native length in seconds.
    pub duration: f64,
    /// Video frame rate.
    pub fps: Fps,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Whether the source exposes a video track.
    pub has_video: bool,
    /// Audio track format, if the source has one.
    pub audio: Option<AudioConfig>,
    /// Timestamp of the first frame/sample.
    pub first_timestamp: f64,
    /// Sample frames per decoded audio buffer.
    pub audio_chunk_frames: usize,
    /// Fail video decoding after this many frames have been produced by one producer.
    pub fail_video_after: Option<usize>,
}

impl SyntheticSource {
    /// A 30 fps, 64x36, video-only source of `duration` seconds.
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            fps: Fps { num: 30, den: 1 },
            width: 64,
            height: 36,
            has_video: true,
            audio: None,
            first_timestamp: 0.0,
            audio_chunk_frames: 1024,
            fail_video_after: None,
        }
    }

    /// Set the native frame size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the native frame rate.
    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }

    /// Add an audio track in `config`.
    pub fn with_audio(mut self, config: AudioConfig) -> Self {
        self.audio = Some(config);
        self
    }

    /// Start both tracks at `ts` instead of 0.
    pub fn with_first_timestamp(mut self, ts: f64) -> Self {
        self.first_timestamp = ts;
        self
    }

    /// Drop the video track.
    pub fn without_video(mut self) -> Self {
        self.has_video = false;
        self
    }

    /// Fail video decoding after `frames` frames of each pass.
    pub fn failing_video_after(mut self, frames: usize) -> Self {
        self.fail_video_after = Some(frames);
        self
    }

    fn frame_count(&self) -> u64 {
        (self.duration * self.fps.as_f64() - TIME_EPS).ceil().max(0.0) as u64
    }

    fn frame_timestamp(&self, idx: u64) -> f64 {
        self.first_timestamp + self.fps.frames_to_secs(idx)
    }
}

/// RGBA value used for every pixel of synthetic frame `idx`.
pub fn synthetic_pixel(idx: u64) -> [u8; 4] {
    [(idx & 0xff) as u8, ((idx >> 8) & 0xff) as u8, 0x40, 0xff]
}

/// Recover the source frame index from a synthetic pixel.
pub fn source_frame_index(px: [u8; 4]) -> u64 {
    u64::from(px[0]) | (u64::from(px[1]) << 8)
}

/// Sample value of synthetic audio at sample frame `n`, channel `ch`.
pub fn synthetic_sample(n: u64, ch: u16) -> f32 {
    let phase = (n % 100) as f32 / 100.0;
    (phase - 0.5) * (1.0 / f32::from(ch + 1))
}

/// [`MediaOpener`] over a fixed set of [`SyntheticSource`]s keyed by path.
///
/// Counts opens and closes so tests can check that every opened input is released.
#[derive(Clone, Debug, Default)]
pub struct SyntheticOpener {
    sources: HashMap<PathBuf, SyntheticSource>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl SyntheticOpener {
    /// Create an opener with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, source: SyntheticSource) -> &mut Self {
        self.sources.insert(path.into(), source);
        self
    }

    /// Number of inputs opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Number of inputs dropped so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl MediaOpener for SyntheticOpener {
    fn open(&self, source: &Path) -> MergeResult<Box<dyn MediaInput>> {
        let src = self.sources.get(source).ok_or_else(|| {
            MergeError::decode(format!("no synthetic source '{}'", source.display()))
        })?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(SyntheticInput {
            src: src.clone(),
            closed: self.closed.clone(),
        }))
    }
}

struct SyntheticInput {
    src: SyntheticSource,
    closed: Arc<AtomicUsize>,
}

impl Drop for SyntheticInput {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl MediaInput for SyntheticInput {
    fn video_track(&self) -> Option<VideoTrackInfo> {
        self.src.has_video.then_some(VideoTrackInfo {
            width: self.src.width,
            height: self.src.height,
            first_timestamp: self.src.first_timestamp,
        })
    }

    fn audio_track(&self) -> Option<AudioTrackInfo> {
        self.src.audio.map(|cfg| AudioTrackInfo {
            sample_rate: cfg.sample_rate,
            channels: cfg.channels,
            first_timestamp: self.src.first_timestamp,
        })
    }

    fn duration(&self) -> f64 {
        self.src.duration
    }

    fn video_frames(&mut self, start: f64, end: f64) -> MergeResult<VideoFrames<'_>> {
        if !self.src.has_video {
            return Err(MergeError::decode("synthetic source has no video track"));
        }
        let src = &self.src;
        let frame_dur = src.fps.frame_duration_secs();
        let total = src.frame_count();
        let source_end = src.first_timestamp + src.duration;
        let fail_after = src.fail_video_after;

        let frames = (0..total)
            .filter(move |&i| {
                let ts = src.frame_timestamp(i);
                ts >= start - TIME_EPS && ts < end - TIME_EPS
            })
            .enumerate()
            .map(move |(produced, i)| {
                if fail_after.is_some_and(|n| produced >= n) {
                    return Err(MergeError::decode(format!(
                        "synthetic decode failure at frame {i}"
                    )));
                }
                let ts = src.frame_timestamp(i);
                let px = synthetic_pixel(i);
                let mut data = Vec::with_capacity((src.width * src.height * 4) as usize);
                for _ in 0..(src.width * src.height) {
                    data.extend_from_slice(&px);
                }
                Ok(VideoFrame {
                    timestamp: ts,
                    duration: frame_dur.min(source_end - ts),
                    width: src.width,
                    height: src.height,
                    data,
                })
            });
        Ok(Box::new(frames))
    }

    fn audio_buffers(&mut self, start: f64, end: f64) -> MergeResult<AudioBuffers<'_>> {
        let Some(cfg) = self.src.audio else {
            return Err(MergeError::decode("synthetic source has no audio track"));
        };
        let rate = f64::from(cfg.sample_rate);
        let total = (self.src.duration * rate).round() as u64;
        let first = self.src.first_timestamp;
        let start_n = (((start - first) * rate).round().max(0.0) as u64).min(total);
        let end_n = (((end - first) * rate).round().max(0.0) as u64).min(total);
        let chunk = self.src.audio_chunk_frames.max(1) as u64;

        let buffers = (start_n..end_n).step_by(chunk as usize).map(move |n0| {
            let n1 = (n0 + chunk).min(end_n);
            let mut interleaved = Vec::with_capacity(((n1 - n0) * u64::from(cfg.channels)) as usize);
            for n in n0..n1 {
                for ch in 0..cfg.channels {
                    interleaved.push(synthetic_sample(n, ch));
                }
            }
            AudioBuffer::new(cfg.sample_rate, cfg.channels, interleaved)
        });
        Ok(Box::new(buffers))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/synthetic.rs"]
mod tests;
