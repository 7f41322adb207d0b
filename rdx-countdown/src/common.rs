//! Contains common, primitive types shared across the crate.
//!
//! This module defines the identity keys handed out by the timer and the
//! closed set of time quantities a milestone can watch. Using distinct key
//! types keeps milestone handles and listener handles from being mixed up.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies a registered milestone.
    ///
    /// Identity is independent of the milestone's trigger value, so any number
    /// of milestones may share one value without overwriting each other. Keys
    /// are never reused, which prevents stale handle bugs after removal.
    pub struct MilestoneId;

    /// Uniquely identifies an event listener registered with `Timer::on_event`.
    pub struct ListenerId;
}

/// The time quantity a milestone is compared against.
///
/// `TimeRemaining` and `ProgressRemaining` count down over a round, the other
/// two count up. Every site that needs to branch on the type matches on this
/// enum exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeType {
    /// Seconds left in the current round.
    TimeRemaining,
    /// Seconds since the round started.
    TimeElapsed,
    /// Fraction of the duration that has elapsed, in `[0, 1]`.
    ProgressElapsed,
    /// Fraction of the duration still remaining, in `[0, 1]`.
    ProgressRemaining,
}

impl TimeType {
    /// Returns `true` for quantities that shrink as the timer runs.
    pub fn is_countdown(self) -> bool {
        match self {
            TimeType::TimeRemaining | TimeType::ProgressRemaining => true,
            TimeType::TimeElapsed | TimeType::ProgressElapsed => false,
        }
    }

    /// Returns `true` if `current` has reached `target`, tolerating `epsilon`
    /// of accumulated floating-point error.
    ///
    /// Countdown quantities reach a value from above, count-up quantities
    /// from below.
    pub fn has_reached(self, current: f64, target: f64, epsilon: f64) -> bool {
        match self {
            TimeType::TimeRemaining | TimeType::ProgressRemaining => current <= target + epsilon,
            TimeType::TimeElapsed | TimeType::ProgressElapsed => current >= target - epsilon,
        }
    }

    /// The largest value this quantity can take for a given duration.
    pub fn upper_bound(self, duration: f64) -> f64 {
        match self {
            TimeType::TimeRemaining | TimeType::TimeElapsed => duration,
            TimeType::ProgressElapsed | TimeType::ProgressRemaining => 1.0,
        }
    }

    /// Converts a value of this quantity into seconds remaining.
    pub fn remaining_at(self, value: f64, duration: f64) -> f64 {
        match self {
            TimeType::TimeRemaining => value,
            TimeType::TimeElapsed => duration - value,
            TimeType::ProgressElapsed => duration * (1.0 - value),
            TimeType::ProgressRemaining => duration * value,
        }
    }

    /// Derives this quantity from seconds remaining.
    ///
    /// A zero duration counts as fully elapsed.
    pub fn value_at_remaining(self, remaining: f64, duration: f64) -> f64 {
        let progress_elapsed = if duration > 0.0 {
            (duration - remaining) / duration
        } else {
            1.0
        };
        match self {
            TimeType::TimeRemaining => remaining,
            TimeType::TimeElapsed => duration - remaining,
            TimeType::ProgressElapsed => progress_elapsed,
            TimeType::ProgressRemaining => 1.0 - progress_elapsed,
        }
    }
}
