use super::*;

#[test]
fn defaults_are_valid() {
    let opts = MergeOpts::default();
    opts.validate().unwrap();
    assert_eq!(opts.fps, Fps { num: 30, den: 1 });
    assert_eq!(opts.fit, FitMode::Fill);
    assert_eq!(opts.default_audio, AudioConfig::new(44_100, 2).unwrap());
    assert_eq!(opts.silence_chunk_secs, 1.0);
}

#[test]
fn partial_json_fills_defaults() {
    let opts: MergeOpts =
        serde_json::from_str(r#"{"canvas":{"width":640,"height":360},"fit":"letterbox"}"#).unwrap();
    assert_eq!(opts.canvas, Some(Canvas { width: 640, height: 360 }));
    assert_eq!(opts.fit, FitMode::Letterbox);
    assert_eq!(opts.scale_filter, ScaleFilter::Triangle);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(serde_json::from_str::<MergeOpts>(r#"{"canvs":null}"#).is_err());
}

#[test]
fn rejects_invalid_values() {
    let opts = MergeOpts {
        canvas: Some(Canvas { width: 0, height: 360 }),
        ..MergeOpts::default()
    };
    assert!(matches!(opts.validate(), Err(MergeError::Input(_))));

    let opts = MergeOpts {
        silence_chunk_secs: 0.0,
        ..MergeOpts::default()
    };
    assert!(matches!(opts.validate(), Err(MergeError::Input(_))));

    let opts = MergeOpts {
        fps: Fps { num: 0, den: 1 },
        ..MergeOpts::default()
    };
    assert!(matches!(opts.validate(), Err(MergeError::Input(_))));
}
