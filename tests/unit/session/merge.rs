use super::*;
use crate::encode::sink::InMemorySink;
use crate::media::synthetic::{SyntheticOpener, SyntheticSource};
use crate::media::{AudioBuffers, VideoFrame, VideoFrames, VideoTrackInfo};
use crate::render::surface::{CpuSurface, ScaleFilter};
use std::path::Path;

fn opener() -> SyntheticOpener {
    let mut o = SyntheticOpener::new();
    o.insert("a", SyntheticSource::new(1.0).with_size(32, 18))
        .insert("b", SyntheticSource::new(0.5).with_size(8, 8));
    o
}

#[test]
fn moves_from_idle_to_done() {
    let mut orch = MergeOrchestrator::new(opener(), InMemorySink::new(), MergeOpts::default());
    assert_eq!(orch.state(), MergeState::Idle);
    let out = orch
        .merge(&[Clip::new("a", 1.0), Clip::new("b", 1.0)], None)
        .unwrap();
    assert_eq!(orch.state(), MergeState::Done);
    assert!(orch.sink().is_finished());
    assert_eq!(out.total_duration, 2.0);
}

#[test]
fn canvas_defaults_to_first_clip_size() {
    let out = merge(
        opener(),
        InMemorySink::new(),
        &[Clip::new("b", 0.5), Clip::new("a", 0.5)],
        MergeOpts::default(),
        None,
    )
    .unwrap();
    assert_eq!(out.canvas, Canvas { width: 8, height: 8 });
}

#[test]
fn second_merge_is_rejected() {
    let mut orch = MergeOrchestrator::new(opener(), InMemorySink::new(), MergeOpts::default());
    orch.merge(&[Clip::new("a", 1.0)], None).unwrap();
    let err = orch.merge(&[Clip::new("a", 1.0)], None).unwrap_err();
    assert!(matches!(err, MergeError::Input(_)));
    assert_eq!(orch.state(), MergeState::Done);
}

#[test]
fn surface_must_match_canvas() {
    let opts = MergeOpts {
        canvas: Some(Canvas { width: 16, height: 16 }),
        ..MergeOpts::default()
    };
    let surface = CpuSurface::new(Canvas { width: 8, height: 8 }, ScaleFilter::Nearest).unwrap();
    let mut orch =
        MergeOrchestrator::new(opener(), InMemorySink::new(), opts).with_surface(Box::new(surface));
    let err = orch.merge(&[Clip::new("a", 1.0)], None).unwrap_err();
    assert!(matches!(err, MergeError::Input(_)));
    assert_eq!(orch.state(), MergeState::Aborted);
}

struct EarlyFrameInput;

impl MediaInput for EarlyFrameInput {
    fn video_track(&self) -> Option<VideoTrackInfo> {
        Some(VideoTrackInfo {
            width: 2,
            height: 2,
            first_timestamp: 0.0,
        })
    }

    fn audio_track(&self) -> Option<AudioTrackInfo> {
        None
    }

    fn duration(&self) -> f64 {
        0.1
    }

    fn video_frames(&mut self, _start: f64, _end: f64) -> MergeResult<VideoFrames<'_>> {
        // One frame ended before the pass, one still on screen at its start, one inside it.
        let frames = [(-0.2, 0.1), (-0.02, 0.05), (0.03, 0.05)]
            .into_iter()
            .map(|(timestamp, duration)| {
                Ok(VideoFrame {
                    timestamp,
                    duration,
                    width: 2,
                    height: 2,
                    data: vec![255; 16],
                })
            });
        Ok(Box::new(frames))
    }

    fn audio_buffers(&mut self, _start: f64, _end: f64) -> MergeResult<AudioBuffers<'_>> {
        Err(MergeError::decode("no audio"))
    }
}

struct EarlyFrameOpener;

impl MediaOpener for EarlyFrameOpener {
    fn open(&self, _source: &Path) -> MergeResult<Box<dyn MediaInput>> {
        Ok(Box::new(EarlyFrameInput))
    }
}

#[test]
fn frame_straddling_pass_start_is_pinned_to_it() {
    let mut orch = MergeOrchestrator::new(EarlyFrameOpener, InMemorySink::new(), MergeOpts::default());
    orch.merge(&[Clip::new("x", 0.1)], None).unwrap();
    let ts: Vec<f64> = orch.sink().frames().iter().map(|f| f.timestamp).collect();
    assert_eq!(ts.len(), 2);
    assert!(ts[0].abs() < 1e-12);
    assert!((ts[1] - 0.03).abs() < 1e-12);
}

#[test]
fn cancelled_before_start_aborts_without_output() {
    let token = CancelToken::new();
    token.cancel();
    let mut orch = MergeOrchestrator::new(opener(), InMemorySink::new(), MergeOpts::default())
        .with_cancel_token(token);
    let err = orch.merge(&[Clip::new("a", 1.0)], None).unwrap_err();
    assert!(matches!(err, MergeError::Cancelled));
    assert!(orch.sink().is_cancelled());
    assert!(orch.sink().frames().is_empty());
}
