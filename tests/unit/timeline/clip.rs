use super::*;

fn spans(plan: &ClipPlan) -> Vec<(f64, f64)> {
    plan.segments
        .iter()
        .map(|s| (s.source_start, s.source_end))
        .collect()
}

#[test]
fn loops_two_second_clip_into_five_seconds() {
    let plan = plan_clip(0, 2.0, 5.0, 0.0).unwrap();
    assert_eq!(spans(&plan), vec![(0.0, 2.0), (0.0, 2.0), (0.0, 1.0)]);
    let loops: Vec<_> = plan.segments.iter().map(|s| s.loop_index).collect();
    assert_eq!(loops, vec![0, 1, 2]);
    let offsets: Vec<_> = plan.segments.iter().map(|s| s.output_offset).collect();
    assert_eq!(offsets, vec![0.0, 2.0, 4.0]);
}

#[test]
fn truncates_long_clip_without_looping() {
    let plan = plan_clip(1, 10.0, 3.0, 7.5).unwrap();
    assert_eq!(spans(&plan), vec![(0.0, 3.0)]);
    assert_eq!(plan.segments[0].output_offset, 7.5);
    assert_eq!(plan.segments[0].clip_index, 1);
}

#[test]
fn exact_multiple_has_no_trailing_sliver() {
    let plan = plan_clip(0, 0.1, 0.3, 0.0).unwrap();
    assert_eq!(plan.segments.len(), 3);
    let total: f64 = plan.segments.iter().map(Segment::duration).sum();
    assert!((total - 0.3).abs() < 1e-9);
}

#[test]
fn durations_always_sum_to_target() {
    for &(native, target) in &[(2.0, 5.0), (1.7, 9.3), (3.0, 3.0), (0.04, 1.0), (5.0, 0.2)] {
        let plan = plan_clip(0, native, target, 0.0).unwrap();
        let total: f64 = plan.segments.iter().map(Segment::duration).sum();
        assert!((total - target).abs() < 1e-9, "{native} -> {target}");
        assert!(plan.segments.iter().all(|s| s.duration() <= native + 1e-12));
        let last = plan.segments.last().unwrap();
        assert!((last.output_end() - target).abs() < 1e-9);
    }
}

#[test]
fn zero_native_duration_is_an_input_error() {
    assert!(matches!(
        plan_clip(0, 0.0, 1.0, 0.0),
        Err(MergeError::Input(_))
    ));
    assert!(plan_clip(0, 1.0, 0.0, 0.0).is_err());
}

#[test]
fn clip_validation_rejects_non_positive_targets() {
    assert!(Clip::new("a.mp4", 0.0).validate(0).is_err());
    assert!(Clip::new("a.mp4", f64::NAN).validate(0).is_err());
    assert!(Clip::new("a.mp4", 1.5).validate(0).is_ok());
}

#[test]
fn tiny_positive_target_still_gets_one_segment() {
    assert!(Clip::new("a.mp4", 1e-12).validate(0).is_ok());
    let plan = plan_clip(2, 2.0, 1e-12, 4.0).unwrap();
    assert_eq!(plan.segments.len(), 1);
    let seg = &plan.segments[0];
    assert_eq!((seg.source_start, seg.source_end), (0.0, 1e-12));
    assert_eq!(seg.output_offset, 4.0);
    assert_eq!(seg.loop_index, 0);
}
