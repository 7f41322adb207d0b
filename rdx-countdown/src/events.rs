//! Defines all public event types emitted by the timer.
//!
//! Events are delivered synchronously to listeners registered with
//! `Timer::on_event`, at the exact point the state change happens. Nothing is
//! queued or batched.

use crate::common::TimeType;
use serde::Serialize;

/// A notification about a change in the timer's state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    /// A new round began from the full duration.
    Started,
    /// A stopped round continued.
    Resumed,
    /// The timer was stopped.
    Stopped,
    /// The remaining time reached zero. Fired once per round.
    Completed,
    /// The clock moved during `update` or `fast_forward`.
    Tick(TimerSnapshot),
    /// The duration was changed.
    DurationChanged { duration: f64 },
}

/// The readable state of a timer at one moment.
///
/// Inside a milestone callback the snapshot reflects the value that triggered
/// the callback rather than the clock's true reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub duration: f64,
    pub remaining: f64,
    pub elapsed: f64,
    pub progress_elapsed: f64,
    pub progress_remaining: f64,
    pub running: bool,
}

impl TimerSnapshot {
    /// Builds a snapshot from a remaining-time reading.
    pub fn from_remaining(duration: f64, remaining: f64, running: bool) -> Self {
        Self {
            duration,
            remaining,
            elapsed: TimeType::TimeElapsed.value_at_remaining(remaining, duration),
            progress_elapsed: TimeType::ProgressElapsed.value_at_remaining(remaining, duration),
            progress_remaining: TimeType::ProgressRemaining.value_at_remaining(remaining, duration),
            running,
        }
    }

    /// Reads one of the four time quantities from the snapshot.
    pub fn value_of(&self, time_type: TimeType) -> f64 {
        match time_type {
            TimeType::TimeRemaining => self.remaining,
            TimeType::TimeElapsed => self.elapsed,
            TimeType::ProgressElapsed => self.progress_elapsed,
            TimeType::ProgressRemaining => self.progress_remaining,
        }
    }
}
