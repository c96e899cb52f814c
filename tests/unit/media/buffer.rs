use super::*;

#[test]
fn audio_buffer_rejects_ragged_interleaving() {
    assert!(AudioBuffer::new(48_000, 2, vec![0.0; 3]).is_err());
    assert!(AudioBuffer::new(0, 2, vec![0.0; 4]).is_err());
    assert!(AudioBuffer::new(48_000, 0, Vec::new()).is_err());
}

#[test]
fn audio_buffer_channel_view_and_truncate() {
    let mut buf = AudioBuffer::new(4, 2, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]).unwrap();
    assert_eq!(buf.frames(), 3);
    assert!((buf.duration_secs() - 0.75).abs() < 1e-12);
    assert_eq!(buf.channel(0).collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    assert_eq!(buf.channel(1).collect::<Vec<_>>(), vec![-1.0, -2.0, -3.0]);

    buf.truncate_frames(1);
    assert_eq!(buf.interleaved, vec![1.0, -1.0]);
}

#[test]
fn silent_buffer_matches_config() {
    let cfg = AudioConfig {
        sample_rate: 44_100,
        channels: 2,
    };
    let buf = AudioBuffer::silent(cfg, 10);
    assert_eq!(buf.config(), cfg);
    assert_eq!(buf.frames(), 10);
    assert!(buf.interleaved.iter().all(|&s| s == 0.0));
}
