use super::*;
use crate::media::synthetic::{SyntheticOpener, SyntheticSource};

#[test]
fn first_clip_with_audio_wins() {
    let mut opener = SyntheticOpener::new();
    opener
        .insert("silent.mp4", SyntheticSource::new(1.0))
        .insert(
            "mono.mp4",
            SyntheticSource::new(1.0).with_audio(AudioConfig::new(22_050, 1).unwrap()),
        )
        .insert(
            "stereo.mp4",
            SyntheticSource::new(1.0).with_audio(AudioConfig::new(48_000, 2).unwrap()),
        );
    let clips = vec![
        Clip::new("silent.mp4", 1.0),
        Clip::new("mono.mp4", 1.0),
        Clip::new("stereo.mp4", 1.0),
    ];

    let cfg = resolve_audio_config(&opener, &clips, AudioConfig::DEFAULT);
    assert_eq!(cfg, AudioConfig::new(22_050, 1).unwrap());
    assert_eq!(opener.opened(), opener.closed());
}

#[test]
fn falls_back_when_nothing_has_audio() {
    let mut opener = SyntheticOpener::new();
    opener.insert("a.mp4", SyntheticSource::new(1.0));
    let clips = vec![Clip::new("a.mp4", 1.0), Clip::new("missing.mp4", 2.0)];

    let cfg = resolve_audio_config(&opener, &clips, AudioConfig::DEFAULT);
    assert_eq!(cfg, AudioConfig::new(44_100, 2).unwrap());
}

#[test]
fn unopenable_clip_is_skipped() {
    let mut opener = SyntheticOpener::new();
    opener.insert(
        "b.mp4",
        SyntheticSource::new(1.0).with_audio(AudioConfig::new(32_000, 2).unwrap()),
    );
    let clips = vec![Clip::new("missing.mp4", 1.0), Clip::new("b.mp4", 1.0)];

    let cfg = resolve_audio_config(&opener, &clips, AudioConfig::DEFAULT);
    assert_eq!(cfg.sample_rate, 32_000);
}
