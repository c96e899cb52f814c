use crate::audio::config::AudioConfig;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::AudioBuffer;
use crate::render::compositor::OutputFrame;

/// Configuration handed to a [`MuxSink`] before any samples are pushed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MuxConfig {
    /// Video track frame size.
    pub canvas: Canvas,
    /// Nominal output frame rate, for sinks that write constant-rate video.
    pub fps: Fps,
    /// Audio track format. Every pushed buffer has exactly this format.
    pub audio: AudioConfig,
}

/// Writer for one video track and one audio track.
///
/// Ordering contract: `push_video` is called with strictly increasing timestamps; `push_audio`
/// buffers are contiguous in submission order. Exactly one of `finish` or `cancel` ends a started
/// sink.
pub trait MuxSink: Send {
    /// Called once before any samples are pushed.
    fn begin(&mut self, cfg: &MuxConfig) -> MergeResult<()>;
    /// Append one composited frame.
    fn push_video(&mut self, frame: &OutputFrame<'_>) -> MergeResult<()>;
    /// Append one audio buffer.
    fn push_audio(&mut self, buf: &AudioBuffer) -> MergeResult<()>;
    /// Close both tracks and return the encoded container bytes.
    fn finish(&mut self) -> MergeResult<Vec<u8>>;
    /// Discard everything written so far.
    fn cancel(&mut self);
}

impl<S: MuxSink + ?Sized> MuxSink for Box<S> {
    fn begin(&mut self, cfg: &MuxConfig) -> MergeResult<()> {
        (**self).begin(cfg)
    }

    fn push_video(&mut self, frame: &OutputFrame<'_>) -> MergeResult<()> {
        (**self).push_video(frame)
    }

    fn push_audio(&mut self, buf: &AudioBuffer) -> MergeResult<()> {
        (**self).push_audio(buf)
    }

    fn finish(&mut self) -> MergeResult<Vec<u8>> {
        (**self).finish()
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}

/// Metadata of one frame captured by [`InMemorySink`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RecordedFrame {
    /// Output timestamp, seconds.
    pub timestamp: f64,
    /// Display duration, seconds.
    pub duration: f64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Top-left pixel.
    pub first_pixel: [u8; 4],
}

/// Summary returned as the "container" bytes of an [`InMemorySink`] (JSON).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InMemorySummary {
    /// Video frames received.
    pub frames: usize,
    /// End of the last frame, seconds.
    pub video_duration: f64,
    /// Audio frames received.
    pub audio_frames: u64,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Audio channel count.
    pub channels: u16,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    keep_pixels: bool,
    cfg: Option<MuxConfig>,
    frames: Vec<RecordedFrame>,
    pixels: Vec<Vec<u8>>,
    audio: Vec<AudioBuffer>,
    finished: bool,
    cancelled: bool,
}

impl InMemorySink {
    /// Sink that records frame metadata and all audio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that additionally keeps a copy of every frame's pixels.
    pub fn with_pixels() -> Self {
        Self {
            keep_pixels: true,
            ..Self::default()
        }
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<MuxConfig> {
        self.cfg
    }

    /// Frames in submission order.
    pub fn frames(&self) -> &[RecordedFrame] {
        &self.frames
    }

    /// Frame pixels in submission order (empty unless built with [`InMemorySink::with_pixels`]).
    pub fn pixels(&self) -> &[Vec<u8>] {
        &self.pixels
    }

    /// Audio buffers in submission order.
    pub fn audio(&self) -> &[AudioBuffer] {
        &self.audio
    }

    /// Total audio sample frames received.
    pub fn audio_frames(&self) -> u64 {
        self.audio.iter().map(|b| b.frames() as u64).sum()
    }

    /// `true` once `finish` succeeded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// `true` once `cancel` was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl MuxSink for InMemorySink {
    fn begin(&mut self, cfg: &MuxConfig) -> MergeResult<()> {
        self.cfg = Some(*cfg);
        self.frames.clear();
        self.pixels.clear();
        self.audio.clear();
        self.finished = false;
        self.cancelled = false;
        Ok(())
    }

    fn push_video(&mut self, frame: &OutputFrame<'_>) -> MergeResult<()> {
        let mut first_pixel = [0u8; 4];
        if let Some(px) = frame.data.get(..4) {
            first_pixel.copy_from_slice(px);
        }
        self.frames.push(RecordedFrame {
            timestamp: frame.timestamp,
            duration: frame.duration,
            width: frame.width,
            height: frame.height,
            first_pixel,
        });
        if self.keep_pixels {
            self.pixels.push(frame.data.to_vec());
        }
        Ok(())
    }

    fn push_audio(&mut self, buf: &AudioBuffer) -> MergeResult<()> {
        self.audio.push(buf.clone());
        Ok(())
    }

    fn finish(&mut self) -> MergeResult<Vec<u8>> {
        let cfg = self
            .cfg
            .ok_or_else(|| MergeError::encode("in-memory sink not started"))?;
        let video_duration = self
            .frames
            .last()
            .map(|f| f.timestamp + f.duration)
            .unwrap_or(0.0);
        let summary = InMemorySummary {
            frames: self.frames.len(),
            video_duration,
            audio_frames: self.audio_frames(),
            sample_rate: cfg.audio.sample_rate,
            channels: cfg.audio.channels,
        };
        self.finished = true;
        serde_json::to_vec(&summary).map_err(|e| MergeError::encode(format!("summary: {e}")))
    }

    fn cancel(&mut self) {
        self.frames.clear();
        self.pixels.clear();
        self.audio.clear();
        self.cancelled = true;
    }
}
