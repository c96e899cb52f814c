use super::*;

#[test]
fn flatten_alpha_0_returns_bg() {
    let src = vec![200u8, 100, 50, 0];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn cfr_grid_repeats_long_frames_and_skips_short_ones() {
    let mut grid = CfrGrid::new(Fps::new(10, 1).unwrap());
    // First frame at 0: nothing before it.
    assert_eq!(grid.advance_to(0.0), 0);
    // Next frame at 0.35: slots 0.0, 0.1, 0.2, 0.3 belong to the first frame.
    assert_eq!(grid.advance_to(0.35), 4);
    // The frame at 0.35 is replaced by one at 0.37 before slot 0.4 is reached.
    assert_eq!(grid.advance_to(0.37), 0);
    // End at 0.5: slot 0.4 shows the last held frame.
    assert_eq!(grid.advance_to(0.5), 1);
}

#[test]
fn odd_canvas_is_padded_to_even() {
    assert_eq!(even_pad_filter(Canvas::new(64, 36).unwrap()), None);
    for (w, h) in [(63, 64), (64, 35), (1, 1)] {
        let filter = even_pad_filter(Canvas::new(w, h).unwrap()).unwrap();
        assert_eq!(filter, "pad=ceil(iw/2)*2:ceil(ih/2)*2");
    }
}

#[test]
fn odd_canvas_is_accepted_when_ffmpeg_is_available() {
    use crate::audio::config::AudioConfig;

    if !is_ffmpeg_on_path() {
        return;
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default());
    let cfg = MuxConfig {
        canvas: Canvas::new(63, 35).unwrap(),
        fps: Fps::new(30, 1).unwrap(),
        audio: AudioConfig::DEFAULT,
    };
    sink.begin(&cfg).unwrap();
    sink.cancel();
}

#[test]
fn unwritable_output_directory_is_an_encode_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let err = ensure_parent_dir(&blocker.join("out.mp4")).unwrap_err();
    assert!(matches!(err, MergeError::Encode(_)), "{err}");
    ensure_parent_dir(&dir.path().join("nested").join("out.mp4")).unwrap();
    assert!(dir.path().join("nested").is_dir());
}
