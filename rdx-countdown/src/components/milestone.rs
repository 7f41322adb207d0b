//! Milestone definitions and the interval math behind range milestones.

use crate::common::TimeType;
use crate::engine::Timer;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The closure run when a milestone fires.
///
/// It receives the timer itself, so it can read the crossed value and add or
/// remove milestones while the scheduler is mid-pass.
pub type MilestoneCallback = Rc<RefCell<dyn FnMut(&mut Timer)>>;

/// Wraps a closure into a `MilestoneCallback`.
pub fn callback(logic: impl FnMut(&mut Timer) + 'static) -> MilestoneCallback {
    Rc::new(RefCell::new(logic))
}

/// A registered trigger condition with its callback.
pub struct Milestone {
    time_type: TimeType,
    trigger_value: f64,
    recurring: bool,
    kind: MilestoneKind,
    pub(crate) callback: MilestoneCallback,
    pub(crate) armed: bool,
}

/// What happens after a milestone first fires.
#[derive(Debug, Clone, PartialEq)]
pub enum MilestoneKind {
    /// Fires once per round at its trigger value.
    Single,
    /// Fires at every interval step between two bounds.
    Range(RangeMilestone),
}

impl Milestone {
    pub(crate) fn single(
        time_type: TimeType,
        trigger_value: f64,
        recurring: bool,
        callback: MilestoneCallback,
    ) -> Self {
        Self {
            time_type,
            trigger_value,
            recurring,
            kind: MilestoneKind::Single,
            callback,
            armed: true,
        }
    }

    pub(crate) fn range(range: RangeMilestone, recurring: bool, callback: MilestoneCallback) -> Self {
        Self {
            time_type: range.time_type(),
            trigger_value: range.range_start(),
            recurring,
            kind: MilestoneKind::Range(range),
            callback,
            armed: true,
        }
    }

    pub fn time_type(&self) -> TimeType {
        self.time_type
    }

    /// The value this milestone is currently indexed under.
    ///
    /// For a range milestone this is the next step it will fire at.
    pub fn trigger_value(&self) -> f64 {
        self.trigger_value
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring
    }

    pub fn kind(&self) -> &MilestoneKind {
        &self.kind
    }

    pub fn as_range(&self) -> Option<&RangeMilestone> {
        match &self.kind {
            MilestoneKind::Range(range) => Some(range),
            MilestoneKind::Single => None,
        }
    }

    /// Whether the milestone is waiting in the index to fire this round.
    ///
    /// Recurring milestones that already fired stay registered but disarmed
    /// until the next reset.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Whether the fire condition holds for the given reading of this
    /// milestone's time type.
    pub fn should_fire(&self, current: f64, epsilon: f64) -> bool {
        self.time_type.has_reached(current, self.trigger_value, epsilon)
    }

    pub(crate) fn set_trigger_value(&mut self, value: f64) {
        self.trigger_value = value;
    }

    pub(crate) fn range_mut(&mut self) -> Option<&mut RangeMilestone> {
        match &mut self.kind {
            MilestoneKind::Range(range) => Some(range),
            MilestoneKind::Single => None,
        }
    }

    /// The value this milestone is indexed under at the start of a round.
    pub(crate) fn initial_trigger_value(&self) -> f64 {
        match &self.kind {
            MilestoneKind::Range(range) => range.range_start(),
            MilestoneKind::Single => self.trigger_value,
        }
    }
}

impl fmt::Debug for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Milestone")
            .field("time_type", &self.time_type)
            .field("trigger_value", &self.trigger_value)
            .field("recurring", &self.recurring)
            .field("kind", &self.kind)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

/// A milestone that repeats at a fixed interval between two bounds.
///
/// `range_start` is always the first value reached in a round and
/// `range_end` the last: for countdown types `range_start >= range_end`, for
/// count-up types `range_start <= range_end`. Bounds passed the other way
/// round are swapped on construction.
///
/// Step values are computed as `range_start ± step * interval` from an
/// integer step counter, so repeated small updates never accumulate drift.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeMilestone {
    time_type: TimeType,
    range_start: f64,
    range_end: f64,
    interval: f64,
    last_triggered: Option<f64>,
    next_step: u32,
}

impl RangeMilestone {
    /// Creates a range. `interval` must be positive; callers validate it.
    pub fn new(time_type: TimeType, range_start: f64, range_end: f64, interval: f64) -> Self {
        let (low, high) = if range_start <= range_end {
            (range_start, range_end)
        } else {
            (range_end, range_start)
        };
        let (range_start, range_end) = if time_type.is_countdown() {
            (high, low)
        } else {
            (low, high)
        };
        Self {
            time_type,
            range_start,
            range_end,
            interval,
            last_triggered: None,
            next_step: 0,
        }
    }

    pub fn time_type(&self) -> TimeType {
        self.time_type
    }

    pub fn range_start(&self) -> f64 {
        self.range_start
    }

    pub fn range_end(&self) -> f64 {
        self.range_end
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// The last value fired at in the current round.
    pub fn last_triggered(&self) -> Option<f64> {
        self.last_triggered
    }

    /// The next value this range will fire at, or `None` once every step of
    /// the round has fired.
    pub fn next_value(&self, epsilon: f64) -> Option<f64> {
        self.value_at(self.next_step, epsilon)
    }

    /// Collects every step value the reading `current` has reached since the
    /// last fire, in chronological order, and records them as fired.
    ///
    /// Steps above `upper_bound` (the duration, or `1.0` for progress types)
    /// can never be observed inside a round and are skipped.
    pub fn take_crossed(&mut self, current: f64, upper_bound: f64, epsilon: f64) -> Vec<f64> {
        let mut crossed = Vec::new();
        while let Some(value) = self.value_at(self.next_step, epsilon) {
            if value > upper_bound + epsilon {
                if self.time_type.is_countdown() {
                    self.next_step += 1;
                    continue;
                }
                break;
            }
            if !self.time_type.has_reached(current, value, epsilon) {
                break;
            }
            crossed.push(value);
            self.last_triggered = Some(value);
            self.next_step += 1;
        }
        crossed
    }

    /// Forgets all fires of the current round.
    pub fn reset(&mut self) {
        self.last_triggered = None;
        self.next_step = 0;
    }

    fn value_at(&self, step: u32, epsilon: f64) -> Option<f64> {
        let offset = f64::from(step) * self.interval;
        if self.time_type.is_countdown() {
            let value = self.range_start - offset;
            if value < self.range_end - epsilon {
                None
            } else {
                Some(value.max(self.range_end))
            }
        } else {
            let value = self.range_start + offset;
            if value > self.range_end + epsilon {
                None
            } else {
                Some(value.min(self.range_end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn bounds_are_normalized_by_direction() {
        let down = RangeMilestone::new(TimeType::TimeRemaining, 1.0, 5.0, 1.0);
        assert_eq!((down.range_start(), down.range_end()), (5.0, 1.0));

        let up = RangeMilestone::new(TimeType::TimeElapsed, 5.0, 1.0, 1.0);
        assert_eq!((up.range_start(), up.range_end()), (1.0, 5.0));
    }

    #[test]
    fn large_step_crosses_every_interval_in_order() {
        let mut range = RangeMilestone::new(TimeType::TimeRemaining, 5.0, 1.0, 1.0);
        let crossed = range.take_crossed(0.5, 10.0, EPS);
        assert_eq!(crossed, vec![5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(range.last_triggered(), Some(1.0));
        assert_eq!(range.next_value(EPS), None);
    }

    #[test]
    fn partial_crossing_leaves_the_next_step_pending() {
        let mut range = RangeMilestone::new(TimeType::TimeElapsed, 2.0, 8.0, 2.0);
        assert_eq!(range.take_crossed(4.5, 10.0, EPS), vec![2.0, 4.0]);
        assert_eq!(range.next_value(EPS), Some(6.0));
        assert!(range.take_crossed(5.9, 10.0, EPS).is_empty());
        assert_eq!(range.take_crossed(6.0, 10.0, EPS), vec![6.0]);
    }

    #[test]
    fn degenerate_range_fires_exactly_once() {
        let mut range = RangeMilestone::new(TimeType::ProgressElapsed, 0.5, 0.5, 0.1);
        assert_eq!(range.take_crossed(0.9, 1.0, EPS), vec![0.5]);
        assert!(range.take_crossed(1.0, 1.0, EPS).is_empty());
    }

    #[test]
    fn steps_never_overshoot_range_end() {
        let mut range = RangeMilestone::new(TimeType::TimeRemaining, 5.0, 1.0, 1.5);
        assert_eq!(range.take_crossed(0.0, 10.0, EPS), vec![5.0, 3.5, 2.0]);
    }

    #[test]
    fn near_miss_on_range_end_snaps_to_the_bound() {
        let mut range = RangeMilestone::new(TimeType::ProgressElapsed, 0.1, 0.3, 0.1);
        let crossed = range.take_crossed(1.0, 1.0, EPS);
        assert_eq!(crossed.len(), 3);
        assert_eq!(*crossed.last().unwrap(), 0.3);
        assert!(crossed.iter().all(|v| (0.1..=0.3).contains(v)));
    }

    #[test]
    fn countdown_steps_beyond_duration_are_skipped() {
        let mut range = RangeMilestone::new(TimeType::TimeRemaining, 15.0, 5.0, 2.5);
        assert_eq!(range.take_crossed(9.0, 10.0, EPS), vec![10.0]);
        assert_eq!(range.next_value(EPS), Some(7.5));
    }

    #[test]
    fn reset_restarts_from_range_start() {
        let mut range = RangeMilestone::new(TimeType::TimeElapsed, 1.0, 3.0, 1.0);
        range.take_crossed(3.0, 3.0, EPS);
        range.reset();
        assert_eq!(range.last_triggered(), None);
        assert_eq!(range.next_value(EPS), Some(1.0));
    }
}
