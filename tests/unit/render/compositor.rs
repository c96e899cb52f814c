use super::*;

fn frame(ts: f64, w: u32, h: u32, px: [u8; 4]) -> VideoFrame {
    VideoFrame {
        timestamp: ts,
        duration: 1.0 / 30.0,
        width: w,
        height: h,
        data: px.iter().copied().cycle().take((w * h * 4) as usize).collect(),
    }
}

fn segment(offset: f64, len: f64) -> Segment {
    Segment {
        clip_index: 0,
        loop_index: 1,
        source_start: 0.0,
        source_end: len,
        output_offset: offset,
    }
}

#[test]
fn stamps_frame_at_segment_offset_plus_local_time() {
    let mut c = FrameCompositor::new(
        Canvas::new(16, 9).unwrap(),
        FitMode::Fill,
        ScaleFilter::Nearest,
        [0, 0, 0, 255],
    )
    .unwrap();
    let seg = segment(4.0, 2.0);
    let out = c.composite(&frame(0.5, 4, 4, [5, 6, 7, 255]), 0.5, &seg).unwrap();
    assert!((out.timestamp - 4.5).abs() < 1e-12);
    assert_eq!((out.width, out.height), (16, 9));
    assert_eq!(out.data.len(), 16 * 9 * 4);
    assert!(out.data.chunks_exact(4).all(|p| p == [5, 6, 7, 255]));
}

#[test]
fn duration_is_clipped_to_segment_end() {
    let mut c = FrameCompositor::new(
        Canvas::new(4, 4).unwrap(),
        FitMode::Fill,
        ScaleFilter::Nearest,
        [0, 0, 0, 255],
    )
    .unwrap();
    let seg = segment(0.0, 1.0);
    let out = c
        .composite(&frame(0.99, 4, 4, [1, 1, 1, 255]), 0.99, &seg)
        .unwrap();
    assert!((out.duration - 0.01).abs() < 1e-9);
}

#[test]
fn scratch_is_cleared_between_frames() {
    let mut c = FrameCompositor::new(
        Canvas::new(8, 4).unwrap(),
        FitMode::Letterbox,
        ScaleFilter::Nearest,
        [0, 0, 0, 255],
    )
    .unwrap();
    let seg = segment(0.0, 1.0);
    // Full-width frame paints everything, then a square one must leave black bars behind.
    let _ = c.composite(&frame(0.0, 8, 4, [9, 9, 9, 255]), 0.0, &seg).unwrap();
    let out = c.composite(&frame(0.1, 4, 4, [9, 9, 9, 255]), 0.1, &seg).unwrap();
    assert_eq!(&out.data[..4], &[0, 0, 0, 255]);
}

#[test]
fn malformed_frame_is_a_decode_error() {
    let mut c = FrameCompositor::new(
        Canvas::new(4, 4).unwrap(),
        FitMode::Fill,
        ScaleFilter::Nearest,
        [0, 0, 0, 255],
    )
    .unwrap();
    let mut f = frame(0.0, 4, 4, [1, 1, 1, 255]);
    f.data.truncate(10);
    assert!(matches!(
        c.composite(&f, 0.0, &segment(0.0, 1.0)),
        Err(MergeError::Decode(_))
    ));
}
