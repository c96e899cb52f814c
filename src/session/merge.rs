use crate::audio::config::{AudioConfig, resolve_audio_config};
use crate::audio::normalize::AudioNormalizer;
use crate::audio::resample::Resampler;
use crate::encode::mux::{MuxStats, TrackMultiplexer};
use crate::encode::sink::{MuxConfig, MuxSink};
use crate::foundation::cancel::CancelToken;
use crate::foundation::core::{Canvas, secs_to_samples_round};
use crate::foundation::error::{MergeError, MergeResult};
use crate::media::{AudioTrackInfo, MediaInput, MediaOpener};
use crate::render::compositor::FrameCompositor;
use crate::render::surface::Surface;
use crate::session::manifest::validate_clips;
use crate::session::opts::MergeOpts;
use crate::session::progress::ProgressAccountant;
use crate::timeline::clip::{Clip, Segment, plan_clip};
use tracing::{debug, info};

const TIME_EPS: f64 = 1e-9;

/// Where a [`MergeOrchestrator`] is in its single run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeState {
    /// Not started.
    Idle,
    /// Checking clips and resolving the output canvas and audio format.
    ResolvingAudioConfig,
    /// Processing the clip at this index.
    ProcessingClip(usize),
    /// Closing the output tracks.
    Finalizing,
    /// Finished successfully.
    Done,
    /// Failed or cancelled; the sink was aborted.
    Aborted,
}

/// Result of a successful merge.
#[derive(Clone, Debug)]
pub struct MergeOutput {
    /// Encoded container bytes as returned by the sink.
    pub bytes: Vec<u8>,
    /// Output frame size.
    pub canvas: Canvas,
    /// Format of the audio track.
    pub audio: AudioConfig,
    /// Sum of all clip target durations, seconds.
    pub total_duration: f64,
    /// What was appended to each track.
    pub stats: MuxStats,
}

/// Drives one merge: clips in order, segments in order, video then audio per segment.
///
/// Single-use. Any failure aborts the multiplexer before the error is returned, and the clip being
/// processed is released on every exit path.
pub struct MergeOrchestrator<O, S> {
    opener: O,
    mux: TrackMultiplexer<S>,
    opts: MergeOpts,
    cancel: CancelToken,
    resampler: Option<Box<dyn Resampler>>,
    surface: Option<Box<dyn Surface>>,
    state: MergeState,
}

impl<O: MediaOpener, S: MuxSink> MergeOrchestrator<O, S> {
    /// Create an idle orchestrator writing to `sink`.
    pub fn new(opener: O, sink: S, opts: MergeOpts) -> Self {
        Self {
            opener,
            mux: TrackMultiplexer::new(sink),
            opts,
            cancel: CancelToken::new(),
            resampler: None,
            surface: None,
            state: MergeState::Idle,
        }
    }

    /// Observe `token` at every segment boundary and before finalizing.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Use `resampler` instead of the built-in [`crate::LinearResampler`].
    pub fn with_resampler(mut self, resampler: Box<dyn Resampler>) -> Self {
        self.resampler = Some(resampler);
        self
    }

    /// Draw frames into `surface` instead of a [`crate::CpuSurface`].
    ///
    /// The surface's canvas must equal the resolved output canvas.
    pub fn with_surface(mut self, surface: Box<dyn Surface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// A handle that cancels this merge from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MergeState {
        self.state
    }

    /// Borrow the output sink.
    pub fn sink(&self) -> &S {
        self.mux.sink()
    }

    /// Consume the orchestrator and return the output sink.
    pub fn into_sink(self) -> S {
        self.mux.into_sink()
    }

    /// Merge `clips` into one video track and one audio track.
    ///
    /// `on_progress` receives 0 before the first clip, a value after every segment, and 100 once
    /// the output is finalized. Values never decrease.
    #[tracing::instrument(skip_all, fields(clips = clips.len()))]
    pub fn merge(
        &mut self,
        clips: &[Clip],
        on_progress: Option<&mut dyn FnMut(u8)>,
    ) -> MergeResult<MergeOutput> {
        if self.state != MergeState::Idle {
            return Err(MergeError::input(
                "merge orchestrator is single-use and has already run",
            ));
        }

        match self.run(clips, on_progress) {
            Ok(out) => {
                self.state = MergeState::Done;
                Ok(out)
            }
            Err(e) => {
                debug!(error = %e, state = ?self.state, "merge failed");
                self.mux.abort();
                self.state = MergeState::Aborted;
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        clips: &[Clip],
        on_progress: Option<&mut dyn FnMut(u8)>,
    ) -> MergeResult<MergeOutput> {
        validate_clips(clips)?;
        self.opts.validate()?;

        self.state = MergeState::ResolvingAudioConfig;
        self.check_native_durations(clips)?;
        let canvas = self.resolve_canvas(clips)?;
        let audio = resolve_audio_config(&self.opener, clips, self.opts.default_audio);
        let total_duration: f64 = clips.iter().map(|c| c.target_duration).sum();

        let mut compositor = match self.surface.take() {
            Some(surface) => {
                if surface.canvas() != canvas {
                    return Err(MergeError::input(format!(
                        "surface is {}x{}, output canvas is {}x{}",
                        surface.canvas().width,
                        surface.canvas().height,
                        canvas.width,
                        canvas.height
                    )));
                }
                FrameCompositor::with_surface(surface, self.opts.fit, self.opts.background_rgba)
            }
            None => FrameCompositor::new(
                canvas,
                self.opts.fit,
                self.opts.scale_filter,
                self.opts.background_rgba,
            )?,
        };
        let mut normalizer = match self.resampler.take() {
            Some(resampler) => AudioNormalizer::with_resampler(audio, resampler),
            None => AudioNormalizer::new(audio),
        }
        .with_silence_chunk_secs(self.opts.silence_chunk_secs);

        info!(
            width = canvas.width,
            height = canvas.height,
            sample_rate = audio.sample_rate,
            channels = audio.channels,
            total_duration,
            "starting merge"
        );
        self.mux.start(MuxConfig {
            canvas,
            fps: self.opts.fps,
            audio,
        })?;

        let mut progress = ProgressAccountant::new(total_duration, on_progress);
        progress.report(0.0);

        let mut cursor = 0.0;
        for (i, clip) in clips.iter().enumerate() {
            self.state = MergeState::ProcessingClip(i);
            self.process_clip(i, clip, cursor, &mut compositor, &mut normalizer, &mut progress)?;
            cursor += clip.target_duration;
        }

        self.check_cancelled()?;
        self.state = MergeState::Finalizing;
        let bytes = self.mux.finalize()?;
        progress.complete();

        Ok(MergeOutput {
            bytes,
            canvas,
            audio,
            total_duration,
            stats: self.mux.stats(),
        })
    }

    fn resolve_canvas(&self, clips: &[Clip]) -> MergeResult<Canvas> {
        if let Some(canvas) = self.opts.canvas {
            canvas.validate()?;
            return Ok(canvas);
        }
        let first = &clips[0];
        let input = self.opener.open(&first.source)?;
        let video = input
            .video_track()
            .ok_or(MergeError::MissingTrack { clip: 0 })?;
        Canvas::new(video.width, video.height)
    }

    /// A clip that cannot be looped is an input error, raised before the sink is started.
    fn check_native_durations(&self, clips: &[Clip]) -> MergeResult<()> {
        for (i, clip) in clips.iter().enumerate() {
            let native = self.opener.open(&clip.source)?.duration();
            if !native.is_finite() || native <= 0.0 {
                return Err(MergeError::input(format!(
                    "clip {i} has zero native duration and cannot be looped"
                )));
            }
        }
        Ok(())
    }

    fn check_cancelled(&self) -> MergeResult<()> {
        if self.cancel.is_cancelled() {
            info!("merge cancelled");
            return Err(MergeError::Cancelled);
        }
        Ok(())
    }

    fn process_clip(
        &mut self,
        clip_index: usize,
        clip: &Clip,
        output_offset: f64,
        compositor: &mut FrameCompositor,
        normalizer: &mut AudioNormalizer,
        progress: &mut ProgressAccountant<'_>,
    ) -> MergeResult<()> {
        self.check_cancelled()?;
        // Dropped on every return path, releasing the clip's decode resources.
        let mut input = self.opener.open(&clip.source)?;
        let video = input
            .video_track()
            .ok_or(MergeError::MissingTrack { clip: clip_index })?;
        let audio_track = input.audio_track();
        let plan = plan_clip(
            clip_index,
            input.duration(),
            clip.target_duration,
            output_offset,
        )?;

        info!(
            clip = clip_index,
            source = %clip.source.display(),
            native = plan.native_duration,
            target = plan.target_duration,
            passes = plan.segments.len(),
            has_audio = audio_track.is_some(),
            "processing clip"
        );

        for seg in &plan.segments {
            self.check_cancelled()?;
            debug!(
                clip = clip_index,
                pass = seg.loop_index,
                source_end = seg.source_end,
                output_offset = seg.output_offset,
                "segment"
            );
            self.append_video(input.as_mut(), video.first_timestamp, seg, compositor)?;
            self.append_audio(input.as_mut(), audio_track, seg, normalizer)?;
            progress.report(seg.output_end());
        }
        Ok(())
    }

    fn append_video(
        &mut self,
        input: &mut dyn MediaInput,
        first_timestamp: f64,
        seg: &Segment,
        compositor: &mut FrameCompositor,
    ) -> MergeResult<()> {
        let start = first_timestamp + seg.source_start;
        let end = first_timestamp + seg.source_end;
        let len = seg.duration();

        for frame in input.video_frames(start, end)? {
            let frame = frame?;
            let mut local = frame.timestamp - start;
            if local >= len - TIME_EPS {
                continue;
            }
            if local < 0.0 {
                // Only a frame still on screen at the pass start is kept, pinned to the start.
                if frame.timestamp + frame.duration <= start + TIME_EPS {
                    continue;
                }
                local = 0.0;
            }
            let out = compositor.composite(&frame, local, seg)?;
            self.mux.add_video_frame(&out)?;
        }
        Ok(())
    }

    fn append_audio(
        &mut self,
        input: &mut dyn MediaInput,
        track: Option<AudioTrackInfo>,
        seg: &Segment,
        normalizer: &mut AudioNormalizer,
    ) -> MergeResult<()> {
        let rate = normalizer.target().sample_rate;
        let target_end = secs_to_samples_round(seg.output_end(), rate);
        let mut needed = target_end.saturating_sub(self.mux.audio_frames_written());

        if let Some(track) = track {
            normalizer.reset();
            let start = track.first_timestamp + seg.source_start;
            let end = track.first_timestamp + seg.source_end;
            for buf in input.audio_buffers(start, end)? {
                if needed == 0 {
                    break;
                }
                let mut buf = normalizer.normalize(buf?)?;
                if buf.frames() as u64 > needed {
                    buf.truncate_frames(needed as usize);
                }
                needed -= buf.frames() as u64;
                self.mux.add_audio_buffer(&buf)?;
            }
        }

        if needed > 0 {
            debug!(frames = needed, "padding audio with silence");
            for chunk in normalizer.silence_frames(needed) {
                self.mux.add_audio_buffer(&chunk)?;
            }
        }
        Ok(())
    }
}

/// Run one merge on a fresh [`MergeOrchestrator`].
pub fn merge<O: MediaOpener, S: MuxSink>(
    opener: O,
    sink: S,
    clips: &[Clip],
    opts: MergeOpts,
    on_progress: Option<&mut dyn FnMut(u8)>,
) -> MergeResult<MergeOutput> {
    MergeOrchestrator::new(opener, sink, opts).merge(clips, on_progress)
}

#[cfg(test)]
#[path = "../../tests/unit/session/merge.rs"]
mod tests;
