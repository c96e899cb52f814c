use super::*;

fn opener_with(src: SyntheticSource) -> SyntheticOpener {
    let mut opener = SyntheticOpener::new();
    opener.insert("a.mp4", src);
    opener
}

#[test]
fn frames_cover_requested_range_in_order() {
    let opener = opener_with(SyntheticSource::new(1.0).with_first_timestamp(0.5));
    let mut input = opener.open(Path::new("a.mp4")).unwrap();
    let frames: Vec<_> = input
        .video_frames(0.5, 1.0)
        .unwrap()
        .collect::<MergeResult<_>>()
        .unwrap();
    assert_eq!(frames.len(), 15);
    assert!((frames[0].timestamp - 0.5).abs() < 1e-9);
    assert!(frames.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(source_frame_index(frames[3].data[..4].try_into().unwrap()), 3);
}

#[test]
fn audio_covers_range_with_bounded_chunks() {
    let cfg = AudioConfig {
        sample_rate: 8_000,
        channels: 1,
    };
    let opener = opener_with(SyntheticSource::new(2.0).with_audio(cfg));
    let mut input = opener.open(Path::new("a.mp4")).unwrap();
    let bufs: Vec<_> = input
        .audio_buffers(0.0, 1.5)
        .unwrap()
        .collect::<MergeResult<_>>()
        .unwrap();
    let total: usize = bufs.iter().map(AudioBuffer::frames).sum();
    assert_eq!(total, 12_000);
    assert!(bufs.iter().all(|b| b.frames() <= 1024));
}

#[test]
fn injected_failure_surfaces_as_decode_error() {
    let opener = opener_with(SyntheticSource::new(1.0).failing_video_after(2));
    let mut input = opener.open(Path::new("a.mp4")).unwrap();
    let results: Vec<_> = input.video_frames(0.0, 1.0).unwrap().collect();
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(MergeError::Decode(_))));
}

#[test]
fn open_and_close_are_counted() {
    let opener = opener_with(SyntheticSource::new(1.0));
    {
        let _input = opener.open(Path::new("a.mp4")).unwrap();
        assert_eq!(opener.opened(), 1);
        assert_eq!(opener.closed(), 0);
    }
    assert_eq!(opener.closed(), 1);
    assert!(opener.open(Path::new("missing.mp4")).is_err());
}
