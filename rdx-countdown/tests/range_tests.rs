//! Integration tests for range milestones.

mod common;
use common::*;

use countdown::prelude::*;

#[test]
fn one_large_step_fires_every_crossed_interval_in_order() {
    let mut timer = Timer::new(10.0);
    let seen = log();
    timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            5.0,
            1.0,
            1.0,
            record_remaining(&seen),
            false,
        )
        .unwrap();
    timer.start();

    timer.update(9.5);

    assert_eq!(*seen.borrow(), vec![5.0, 4.0, 3.0, 2.0, 1.0]);
    assert_eq!(timer.remaining(), 0.5);
    assert_eq!(timer.milestone_count(), 0);
}

#[test]
fn many_small_steps_never_leave_the_range() {
    let mut timer = Timer::new(10.0);
    let seen = log();
    timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            5.0,
            1.0,
            1.0,
            record_remaining(&seen),
            false,
        )
        .unwrap();
    timer.start();

    for _ in 0..100 {
        timer.update(0.1);
    }

    let seen = seen.borrow();
    assert_eq!(*seen, vec![5.0, 4.0, 3.0, 2.0, 1.0]);
    assert!(seen.iter().all(|value| (1.0..=5.0).contains(value)));
}

#[test]
fn count_up_range_with_fractional_interval() {
    let mut timer = Timer::new(3.0);
    let seen = log();
    let id = timer
        .add_range_milestone(
            TimeType::TimeElapsed,
            0.5,
            2.0,
            0.5,
            record(&seen, TimeType::TimeElapsed),
            false,
        )
        .unwrap();
    timer.start();

    timer.update(1.2);
    assert_eq!(*seen.borrow(), vec![0.5, 1.0]);
    let range = timer.milestone(id).unwrap();
    assert_eq!(range.trigger_value(), 1.5);
    assert_eq!(range.as_range().unwrap().last_triggered(), Some(1.0));

    timer.update(0.9);
    assert_eq!(*seen.borrow(), vec![0.5, 1.0, 1.5, 2.0]);
}

#[test]
fn progress_remaining_range_counts_down() {
    let mut timer = Timer::new(8.0);
    let seen = log();
    timer
        .add_range_milestone(
            TimeType::ProgressRemaining,
            0.75,
            0.25,
            0.25,
            record(&seen, TimeType::ProgressRemaining),
            false,
        )
        .unwrap();
    timer.start();

    timer.update(6.0);

    assert_eq!(*seen.borrow(), vec![0.75, 0.5, 0.25]);
}

#[test]
fn degenerate_range_fires_exactly_once() {
    let mut timer = Timer::new(10.0);
    let fired = counter();
    timer
        .add_range_milestone(TimeType::TimeElapsed, 2.0, 2.0, 1.0, count(&fired), false)
        .unwrap();
    timer.start();

    timer.update(5.0);
    timer.update(1.0);

    assert_eq!(fired.get(), 1);
}

#[test]
fn reversed_bounds_are_normalized() {
    let mut timer = Timer::new(5.0);
    let seen = log();
    let id = timer
        .add_range_milestone(
            TimeType::TimeElapsed,
            3.0,
            1.0,
            1.0,
            record(&seen, TimeType::TimeElapsed),
            false,
        )
        .unwrap();

    let range = timer.milestone(id).unwrap().as_range().unwrap();
    assert_eq!((range.range_start(), range.range_end()), (1.0, 3.0));

    timer.start();
    timer.update(4.0);
    assert_eq!(*seen.borrow(), vec![1.0, 2.0, 3.0]);
}

#[test]
fn recurring_range_replays_every_round() {
    let mut timer = Timer::new(5.0);
    let recurring = log();
    let one_shot = log();
    timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            3.0,
            1.0,
            1.0,
            record_remaining(&recurring),
            true,
        )
        .unwrap();
    timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            3.0,
            1.0,
            1.0,
            record_remaining(&one_shot),
            false,
        )
        .unwrap();

    for _ in 0..2 {
        timer.start();
        timer.update(5.0);
        timer.reset();
    }

    assert_eq!(*recurring.borrow(), vec![3.0, 2.0, 1.0, 3.0, 2.0, 1.0]);
    assert_eq!(*one_shot.borrow(), vec![3.0, 2.0, 1.0]);
    assert_eq!(timer.milestone_count(), 1);
}

#[test]
fn reset_restarts_a_partially_fired_range() {
    let mut timer = Timer::new(5.0);
    let seen = log();
    timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            3.0,
            1.0,
            1.0,
            record_remaining(&seen),
            false,
        )
        .unwrap();

    timer.start();
    timer.update(2.5);
    timer.reset();
    timer.start();
    timer.update(5.0);

    assert_eq!(*seen.borrow(), vec![3.0, 3.0, 2.0, 1.0]);
}

#[test]
fn range_may_remove_itself_mid_range() {
    let mut timer = Timer::new(10.0);
    let seen = log();
    let sink = seen.clone();
    let id = timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            5.0,
            1.0,
            1.0,
            move |timer| {
                let crossing = timer.current_crossing().unwrap();
                sink.borrow_mut().push(crossing.value);
                if crossing.value <= 4.0 {
                    let ids: Vec<MilestoneId> = timer.milestones().map(|(id, _)| id).collect();
                    for id in ids {
                        timer.remove_milestone(id);
                    }
                }
            },
            false,
        )
        .unwrap();
    timer.start();

    timer.update(9.5);

    assert_eq!(*seen.borrow(), vec![5.0, 4.0]);
    assert!(timer.milestone(id).is_none());
}

#[test]
fn countdown_steps_above_the_duration_are_skipped() {
    let mut timer = Timer::new(4.0);
    let seen = log();
    timer
        .add_range_milestone(
            TimeType::TimeRemaining,
            6.0,
            2.0,
            1.0,
            record_remaining(&seen),
            false,
        )
        .unwrap();
    timer.start();

    timer.update(0.0);
    timer.update(3.0);

    assert_eq!(*seen.borrow(), vec![4.0, 3.0, 2.0]);
}

#[test]
fn recurring_range_removed_mid_burst_stops_firing() {
    let mut timer = Timer::new(10.0);
    let seen = log();
    let sink = seen.clone();
    timer
        .add_range_milestone(
            TimeType::TimeElapsed,
            1.0,
            5.0,
            1.0,
            move |timer| {
                let value = timer.current_crossing().unwrap().value;
                sink.borrow_mut().push(value);
                if value >= 2.0 {
                    timer.remove_milestones_of_type(TimeType::TimeElapsed);
                }
            },
            true,
        )
        .unwrap();
    timer.start();

    timer.update(3.5);
    timer.reset();
    timer.start();
    timer.update(10.0);

    assert_eq!(*seen.borrow(), vec![1.0, 2.0]);
    assert_eq!(timer.milestone_count(), 0);
}
