//! The time model: duration, the remaining-time reading, and the control
//! operations that move it.
//!
//! `TimeModel` is a complete basic timer on its own. It knows nothing about
//! milestones or events; `Timer` composes it with the scheduler and turns the
//! outcomes reported here into notifications.

use crate::common::TimeType;
use tracing::{debug, trace};

/// Storage for the remaining-time reading.
///
/// By default a `TimeModel` owns its clock through `LocalStore`. Hosts that
/// keep the authoritative value elsewhere (a network-synchronized session
/// timer, a save slot, a shared simulation clock) implement this trait and hand
/// the store to `TimeModel::with_store`.
pub trait TimeStore {
    /// Returns the current remaining time in seconds.
    fn remaining(&self) -> f64;

    /// Overwrites the remaining time. Only called when `can_set` is `true`.
    fn set_remaining(&mut self, value: f64);

    /// Whether the model may write to this store.
    ///
    /// A read-only store turns every write the model would perform into a
    /// no-op; the reading advances only when the owner of the store moves it.
    fn can_set(&self) -> bool {
        true
    }
}

/// The default, in-memory `TimeStore`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalStore {
    remaining: f64,
}

impl LocalStore {
    pub fn new(remaining: f64) -> Self {
        Self { remaining }
    }
}

impl TimeStore for LocalStore {
    fn remaining(&self) -> f64 {
        self.remaining
    }

    fn set_remaining(&mut self, value: f64) {
        self.remaining = value;
    }
}

/// The result of moving the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    /// Remaining time before the move.
    pub previous: f64,
    /// Remaining time after the move, already clamped to `[0, duration]`.
    pub current: f64,
}

/// Owns the duration, the running flag and the remaining-time reading.
///
/// Invariant: while running, `0 <= remaining <= duration`. Immediately after
/// `start` or `reset` (with a writable store) `remaining == duration`.
pub struct TimeModel {
    duration: f64,
    running: bool,
    store: Box<dyn TimeStore>,
}

impl std::fmt::Debug for TimeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeModel")
            .field("duration", &self.duration)
            .field("remaining", &self.remaining())
            .field("running", &self.running)
            .field("can_set", &self.store.can_set())
            .finish()
    }
}

impl TimeModel {
    /// Creates a stopped model that owns its own clock, reset to `duration`.
    ///
    /// Negative or non-finite durations are treated as zero.
    pub fn new(duration: f64) -> Self {
        Self::with_store(duration, Box::new(LocalStore::default()))
    }

    /// Creates a stopped model backed by an external store.
    ///
    /// The model is reset on construction, which writes `duration` into the
    /// store if the store is writable.
    pub fn with_store(duration: f64, store: Box<dyn TimeStore>) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        let mut model = Self {
            duration,
            running: false,
            store,
        };
        model.reset();
        model
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds left in the round, clamped to `[0, duration]`.
    pub fn remaining(&self) -> f64 {
        self.store.remaining().clamp(0.0, self.duration)
    }

    pub fn elapsed(&self) -> f64 {
        self.value_of(TimeType::TimeElapsed)
    }

    pub fn progress_elapsed(&self) -> f64 {
        self.value_of(TimeType::ProgressElapsed)
    }

    pub fn progress_remaining(&self) -> f64 {
        self.value_of(TimeType::ProgressRemaining)
    }

    /// Reads any of the four time quantities.
    pub fn value_of(&self, time_type: TimeType) -> f64 {
        time_type.value_at_remaining(self.remaining(), self.duration)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the backing store accepts writes.
    pub fn can_set(&self) -> bool {
        self.store.can_set()
    }

    /// Starts a new round from the full duration.
    ///
    /// With a read-only store the reading is left untouched and only the
    /// running flag changes.
    pub fn start(&mut self) {
        self.write_remaining(self.duration);
        self.running = true;
        debug!(duration = self.duration, "time model started");
    }

    /// Continues a stopped round. Returns `false` (and stays stopped) when
    /// there is no time left to run.
    pub fn resume(&mut self) -> bool {
        if self.remaining() <= 0.0 {
            return false;
        }
        self.running = true;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Rewinds the reading to the full duration and stops the model.
    pub fn reset(&mut self) {
        self.write_remaining(self.duration);
        self.running = false;
    }

    /// Moves the clock forward by `delta` seconds without checking for
    /// completion.
    ///
    /// Returns `None` when the model is not running. `delta` is expected to
    /// be non-negative. Follow with `settle` once anything that reacts to the
    /// move has run.
    pub fn advance(&mut self, delta: f64) -> Option<Advance> {
        if !self.running {
            return None;
        }
        Some(self.move_by(-delta))
    }

    /// Finishes the round if the reading has hit zero while running.
    ///
    /// Returns `true` exactly once per round: the model stops, so later calls
    /// return `false` until it is started or resumed again.
    pub fn settle(&mut self) -> bool {
        if !self.running || self.remaining() > 0.0 {
            return false;
        }
        self.write_remaining(0.0);
        self.running = false;
        debug!(duration = self.duration, "time model completed");
        true
    }

    /// `advance` followed by `settle`, for callers that use the model as a
    /// plain timer. Returns whether this tick completed the round.
    pub fn tick(&mut self, delta: f64) -> Option<bool> {
        self.advance(delta)?;
        Some(self.settle())
    }

    /// Skips `seconds` ahead, clamped at zero.
    ///
    /// Negative or non-finite amounts, and read-only stores, are rejected as
    /// no-ops and return `None`. Works while stopped; completion is left to
    /// `settle`.
    pub fn fast_forward(&mut self, seconds: f64) -> Option<Advance> {
        if !(seconds >= 0.0 && seconds.is_finite()) {
            debug!(seconds, "rejected fast-forward by an invalid amount");
            return None;
        }
        if !self.can_set() {
            return None;
        }
        Some(self.move_by(-seconds))
    }

    /// Moves the reading back by `seconds`, clamped at the duration.
    ///
    /// Never completes the round. Returns `false` for rejected amounts or a
    /// read-only store.
    pub fn rewind(&mut self, seconds: f64) -> bool {
        if !(seconds >= 0.0 && seconds.is_finite()) {
            debug!(seconds, "rejected rewind by an invalid amount");
            return false;
        }
        if !self.can_set() {
            return false;
        }
        self.move_by(seconds);
        true
    }

    /// Changes the duration, clamping the reading into the new range.
    ///
    /// Returns `true` if the duration changed. Negative or non-finite values
    /// are ignored.
    pub fn set_duration(&mut self, duration: f64) -> bool {
        if !(duration >= 0.0 && duration.is_finite()) {
            debug!(duration, "rejected invalid duration");
            return false;
        }
        if duration == self.duration {
            return false;
        }
        self.duration = duration;
        let remaining = self.store.remaining();
        if remaining > duration {
            self.write_remaining(duration);
        }
        true
    }

    fn move_by(&mut self, seconds: f64) -> Advance {
        let previous = self.remaining();
        self.write_remaining(previous + seconds);
        let current = self.remaining();
        trace!(previous, current, "time model moved");
        Advance { previous, current }
    }

    fn write_remaining(&mut self, value: f64) {
        if self.store.can_set() {
            self.store.set_remaining(value.clamp(0.0, self.duration));
        }
    }
}
