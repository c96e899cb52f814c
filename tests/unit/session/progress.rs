use super::*;

#[test]
fn rounds_to_nearest_percent() {
    let mut p = ProgressAccountant::new(6.0, None);
    assert_eq!(p.report(0.0), 0);
    assert_eq!(p.report(1.0), 17);
    assert_eq!(p.report(4.0), 67);
    assert_eq!(p.report(6.0), 100);
}

#[test]
fn clamps_overshoot_from_float_drift() {
    let mut p = ProgressAccountant::new(3.0, None);
    assert_eq!(p.report(3.000_000_1), 100);
    assert_eq!(p.report(10.0), 100);
}

#[test]
fn never_reports_a_decrease() {
    let mut seen = Vec::new();
    let mut cb = |pct: u8| seen.push(pct);
    {
        let mut p = ProgressAccountant::new(10.0, Some(&mut cb));
        p.report(5.0);
        p.report(2.0);
        p.report(5.0);
        p.complete();
    }
    assert_eq!(seen, vec![50, 50, 50, 100]);
}

#[test]
fn complete_always_sends_100() {
    let mut p = ProgressAccountant::new(10.0, None);
    assert_eq!(p.last(), None);
    p.report(1.0);
    assert_eq!(p.complete(), 100);
    assert_eq!(p.last(), Some(100));
}

#[test]
fn zero_total_is_all_or_nothing() {
    assert_eq!(percent(0.0, 0.0), 0);
    assert_eq!(percent(1.0, 0.0), 100);
}
