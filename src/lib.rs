//! clipmerge joins independently encoded clips into one continuous video with a single video
//! track and a single audio track.
//!
//! Every clip gets its own target duration: shorter sources are looped from the start, longer
//! ones are truncated. Audio from all clips is normalized to one sample rate and channel layout,
//! clips without audio contribute silence, and the two tracks stay aligned sample for sample.
//!
//! - Describe the merge as a list of [`Clip`]s plus [`MergeOpts`]
//! - Supply a [`MediaOpener`] (decoding) and a [`MuxSink`] (encoding)
//! - Run [`merge`] or a [`MergeOrchestrator`] with an optional progress callback
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod audio;
/// Output track writers.
pub mod encode;
/// Decoding boundary and bundled decoders.
pub mod media;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod timeline;

pub use crate::foundation::cancel::CancelToken;
pub use crate::foundation::core::{Canvas, Fps};
pub use crate::foundation::error::{MergeError, MergeResult};

pub use crate::audio::config::{AudioConfig, resolve_audio_config};
pub use crate::audio::normalize::{AudioNormalizer, DEFAULT_SILENCE_CHUNK_SECS, SilenceChunks};
pub use crate::audio::resample::{LinearResampler, Resampler, remix_interleaved};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::mux::{MuxStats, TrackMultiplexer};
pub use crate::encode::sink::{InMemorySink, InMemorySummary, MuxConfig, MuxSink, RecordedFrame};
pub use crate::media::ffmpeg::{FfmpegOpener, ProbeInfo, is_ffprobe_on_path, probe_media};
pub use crate::media::{
    AudioBuffer, AudioTrackInfo, MediaInput, MediaOpener, VideoFrame, VideoTrackInfo,
};
pub use crate::render::compositor::{FrameCompositor, OutputFrame};
pub use crate::render::surface::{CpuSurface, DrawRect, FitMode, ScaleFilter, Surface, fit_rect};
pub use crate::session::manifest::MergeManifest;
pub use crate::session::merge::{MergeOrchestrator, MergeOutput, MergeState, merge};
pub use crate::session::opts::MergeOpts;
pub use crate::session::progress::ProgressAccountant;
pub use crate::timeline::clip::{Clip, ClipPlan, Segment, plan_clip};
