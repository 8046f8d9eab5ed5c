// ABOUTME: Tests for cycle-aligned alarm computation
// ABOUTME: The recommended wake time is the latest 90-minute boundary before the target
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Sleephub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sleephub_server::intelligence::{compute_alarm, AlarmScheduler};

fn t() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 23, 0, 0).single().unwrap()
}

fn minutes(m: i64) -> Duration {
    Duration::minutes(m)
}

#[test]
fn test_target_in_the_past_is_returned_unchanged() {
    for offset in [0, 1, 90, 600] {
        let target = t() - minutes(offset);
        let result = compute_alarm(target, t());

        assert_eq!(result.cycles_to_target, 0, "offset {offset}");
        assert_eq!(result.recommended_time, target);
        assert_eq!(result.optimal_wake_time, target);
    }
}

#[test]
fn test_less_than_one_cycle_wakes_at_target() {
    let result = compute_alarm(t() + minutes(45), t());

    assert_eq!(result.cycles_to_target, 0);
    assert_eq!(result.recommended_time, t() + minutes(45));
}

#[test]
fn test_one_cycle_fits() {
    let result = compute_alarm(t() + minutes(100), t());

    assert_eq!(result.cycles_to_target, 1);
    assert_eq!(result.recommended_time, t() + minutes(90));
}

#[test]
fn test_two_cycles_fit() {
    let result = compute_alarm(t() + minutes(200), t());

    assert_eq!(result.cycles_to_target, 2);
    assert_eq!(result.recommended_time, t() + minutes(180));
}

#[test]
fn test_exactly_one_cycle_lands_on_target() {
    let result = compute_alarm(t() + minutes(90), t());

    assert_eq!(result.cycles_to_target, 1);
    assert_eq!(result.recommended_time, t() + minutes(90));
}

#[test]
fn test_recommended_time_never_exceeds_target() {
    let scheduler = AlarmScheduler::default();
    for offset in (0..=720).step_by(7) {
        let target = t() + minutes(offset);
        let result = scheduler.compute(target, t());

        assert!(result.recommended_time <= target, "offset {offset}");
        if result.cycles_to_target > 0 {
            let since_start = (result.recommended_time - t()).num_minutes();
            assert_eq!(since_start % 90, 0, "offset {offset}");
            assert_eq!(
                since_start / 90,
                i64::from(result.cycles_to_target),
                "offset {offset}"
            );
            assert!(target - result.recommended_time < minutes(90));
        } else {
            assert_eq!(result.recommended_time, target);
        }
    }
}

#[test]
fn test_millisecond_short_of_boundary_rounds_down() {
    let target = t() + minutes(180) - Duration::milliseconds(1);
    let result = compute_alarm(target, t());

    assert_eq!(result.cycles_to_target, 1);
    assert_eq!(result.recommended_time, t() + minutes(90));
}
