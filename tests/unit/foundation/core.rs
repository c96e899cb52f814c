use super::*;

#[test]
fn fps_frames_secs_roundtrip_floor() {
    let fps = Fps::new(30000, 1001).unwrap();
    let secs = fps.frames_to_secs(123);
    assert_eq!(fps.secs_to_frames_floor(secs), 123);
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 360).is_err());
    assert!(Canvas::new(640, 0).is_err());
    let c = Canvas::new(640, 360).unwrap();
    assert_eq!(c.rgba_len(), 640 * 360 * 4);
}

#[test]
fn sample_conversion_rounds_to_nearest() {
    assert_eq!(secs_to_samples_round(1.0, 44_100), 44_100);
    assert_eq!(secs_to_samples_round(0.5 / 44_100.0 + 1e-9, 44_100), 1);
    assert_eq!(secs_to_samples_round(-1.0, 44_100), 0);
    assert!((samples_to_secs(22_050, 44_100) - 0.5).abs() < 1e-12);
}
