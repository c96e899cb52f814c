use crate::encode::sink::{MuxConfig, MuxSink};
use crate::foundation::core::samples_to_secs;
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::AudioBuffer;
use crate::render::compositor::OutputFrame;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MuxState {
    Idle,
    Open,
    Finalized,
    Aborted,
}

/// Running totals of what has been appended to each track.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct MuxStats {
    /// Video frames appended.
    pub video_frames: u64,
    /// End of the last appended frame on the output timeline, seconds.
    pub video_duration: f64,
    /// Audio sample frames appended.
    pub audio_frames: u64,
    /// Appended audio length in seconds.
    pub audio_duration: f64,
}

/// Owns the output video and audio tracks.
///
/// Video frames must arrive with strictly increasing timestamps and the configured frame size;
/// audio buffers must match the configured [`crate::AudioConfig`] exactly. Violations are encode
/// errors. Once finalized or aborted the multiplexer accepts nothing further.
pub struct TrackMultiplexer<S> {
    sink: S,
    state: MuxState,
    cfg: Option<MuxConfig>,
    last_video_ts: Option<f64>,
    stats: MuxStats,
}

impl<S: MuxSink> TrackMultiplexer<S> {
    /// Wrap `sink`; tracks open on [`TrackMultiplexer::start`].
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: MuxState::Idle,
            cfg: None,
            last_video_ts: None,
            stats: MuxStats::default(),
        }
    }

    /// Open both tracks.
    pub fn start(&mut self, cfg: MuxConfig) -> MergeResult<()> {
        if self.state != MuxState::Idle {
            return Err(MergeError::encode("multiplexer already started"));
        }
        cfg.canvas.validate()?;
        cfg.audio.validate()?;
        self.sink.begin(&cfg)?;
        self.cfg = Some(cfg);
        self.state = MuxState::Open;
        Ok(())
    }

    fn open_cfg(&self) -> MergeResult<MuxConfig> {
        match (self.state, self.cfg) {
            (MuxState::Open, Some(cfg)) => Ok(cfg),
            (MuxState::Idle, _) => Err(MergeError::encode("multiplexer not started")),
            _ => Err(MergeError::encode("multiplexer is closed")),
        }
    }

    /// Append one composited frame to the video track.
    pub fn add_video_frame(&mut self, frame: &OutputFrame<'_>) -> MergeResult<()> {
        let cfg = self.open_cfg()?;
        if frame.width != cfg.canvas.width || frame.height != cfg.canvas.height {
            return Err(MergeError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.canvas.width, cfg.canvas.height
            )));
        }
        if frame.data.len() != cfg.canvas.rgba_len() {
            return Err(MergeError::encode(
                "frame data size mismatch with width*height*4",
            ));
        }
        if !frame.timestamp.is_finite() || frame.timestamp < 0.0 {
            return Err(MergeError::encode(format!(
                "invalid frame timestamp {}",
                frame.timestamp
            )));
        }
        if let Some(last) = self.last_video_ts
            && frame.timestamp <= last
        {
            return Err(MergeError::encode(format!(
                "non-monotonic video timestamp {:.6}s after {:.6}s",
                frame.timestamp, last
            )));
        }

        self.sink.push_video(frame)?;
        self.last_video_ts = Some(frame.timestamp);
        self.stats.video_frames += 1;
        self.stats.video_duration = frame.timestamp + frame.duration;
        Ok(())
    }

    /// Append one buffer to the audio track, contiguous with the previous one.
    pub fn add_audio_buffer(&mut self, buf: &AudioBuffer) -> MergeResult<()> {
        let cfg = self.open_cfg()?;
        if buf.config() != cfg.audio {
            return Err(MergeError::encode(format!(
                "audio buffer is {} Hz / {} ch, track is {} Hz / {} ch",
                buf.sample_rate, buf.channels, cfg.audio.sample_rate, cfg.audio.channels
            )));
        }
        if !buf
            .interleaved
            .len()
            .is_multiple_of(usize::from(buf.channels))
        {
            return Err(MergeError::encode("ragged audio buffer"));
        }
        if buf.is_empty() {
            return Ok(());
        }

        self.sink.push_audio(buf)?;
        self.stats.audio_frames += buf.frames() as u64;
        self.stats.audio_duration = samples_to_secs(self.stats.audio_frames, cfg.audio.sample_rate);
        Ok(())
    }

    /// Audio sample frames appended so far.
    pub fn audio_frames_written(&self) -> u64 {
        self.stats.audio_frames
    }

    /// What has been appended so far.
    pub fn stats(&self) -> MuxStats {
        self.stats
    }

    /// Close both tracks and return the encoded bytes.
    pub fn finalize(&mut self) -> MergeResult<Vec<u8>> {
        self.open_cfg()?;
        let bytes = self.sink.finish()?;
        self.state = MuxState::Finalized;
        info!(
            video_frames = self.stats.video_frames,
            video_duration = self.stats.video_duration,
            audio_duration = self.stats.audio_duration,
            bytes = bytes.len(),
            "finalized output"
        );
        Ok(bytes)
    }

    /// Discard all written state. No-op unless the tracks are open.
    pub fn abort(&mut self) {
        if self.state == MuxState::Open {
            debug!("aborting output");
            self.sink.cancel();
        }
        if self.state != MuxState::Finalized {
            self.state = MuxState::Aborted;
        }
    }

    /// `true` after [`TrackMultiplexer::abort`] discarded the output.
    pub fn is_aborted(&self) -> bool {
        self.state == MuxState::Aborted
    }

    /// Borrow the wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Return the wrapped sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mux.rs"]
mod tests;
