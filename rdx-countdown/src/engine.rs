//! The timer that ties the time model, the milestone index and the trigger
//! scheduler together.

use crate::common::{ListenerId, MilestoneId, TimeType};
use crate::components::context::{CallbackContext, Crossing};
use crate::components::index::{MilestoneIndex, TriggerKey};
use crate::components::milestone::{callback, Milestone, MilestoneCallback, RangeMilestone};
use crate::config::{TimerConfig, DEFAULT_EPSILON};
use crate::error::MilestoneError;
use crate::events::{TimerEvent, TimerSnapshot};
use crate::time::{TimeModel, TimeStore};
use slotmap::SlotMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, trace};

/// A closure notified of every `TimerEvent`.
pub type EventListener = Rc<RefCell<dyn FnMut(&TimerEvent)>>;

/// The callback runs owed by one due milestone.
struct Firing {
    callback: MilestoneCallback,
    crossings: Vec<Crossing>,
    retire: Option<Retire>,
}

/// What happens to a milestone once its last due crossing fires.
#[derive(Debug, Clone, Copy)]
enum Retire {
    Disarm,
    Unregister,
}

/// A countdown/count-up timer with milestones.
///
/// The host drives the timer by calling `update` with its frame delta. After
/// every move of the clock the trigger scheduler fires each milestone whose
/// condition became true, in ascending order of trigger value, until nothing
/// else is due. Callbacks receive the timer and may add or remove milestones,
/// including their own, while the pass is running.
///
/// The timer is single-threaded; all work happens inside the calls the host
/// makes.
pub struct Timer {
    clock: TimeModel,
    milestones: MilestoneIndex,
    context: CallbackContext,
    listeners: SlotMap<ListenerId, EventListener>,
    epsilon: f64,
    completed: bool,
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("clock", &self.clock)
            .field("milestones", &self.milestones.len())
            .field("listeners", &self.listeners.len())
            .field("epsilon", &self.epsilon)
            .field("completed", &self.completed)
            .finish()
    }
}

// Core implementation block: time control and the scheduler.
impl Timer {
    /// Creates a stopped timer that owns its own clock.
    pub fn new(duration: f64) -> Self {
        Self::from_model(TimeModel::new(duration))
    }

    /// Creates a stopped timer whose remaining time lives in `store`.
    pub fn with_store(duration: f64, store: Box<dyn TimeStore>) -> Self {
        Self::from_model(TimeModel::with_store(duration, store))
    }

    /// Creates a timer from a loaded configuration.
    pub fn from_config(config: &TimerConfig) -> Self {
        Self::new(config.duration).with_epsilon(config.epsilon)
    }

    /// Sets the tolerance used for every float comparison.
    ///
    /// Non-positive or non-finite values are ignored.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        if epsilon > 0.0 && epsilon.is_finite() {
            self.epsilon = epsilon;
        }
        self
    }

    fn from_model(clock: TimeModel) -> Self {
        Self {
            clock,
            milestones: MilestoneIndex::new(),
            context: CallbackContext::new(),
            listeners: SlotMap::with_key(),
            epsilon: DEFAULT_EPSILON,
            completed: false,
        }
    }

    /// Starts a new round from the full duration.
    pub fn start(&mut self) {
        self.clock.start();
        self.completed = false;
        self.emit(TimerEvent::Started);
    }

    /// Continues a stopped round. Does nothing if no time is left.
    pub fn resume(&mut self) {
        if self.clock.resume() {
            debug!(remaining = self.clock.remaining(), "timer resumed");
            self.emit(TimerEvent::Resumed);
        }
    }

    pub fn stop(&mut self) {
        self.clock.stop();
        debug!(remaining = self.clock.remaining(), "timer stopped");
        self.emit(TimerEvent::Stopped);
    }

    /// Rewinds to the full duration, stops, and re-arms milestones.
    ///
    /// Range milestones restart from `range_start`; recurring milestones that
    /// fired this round go back into the index. One-shot milestones that
    /// already fired stay gone. Nothing fires during a reset.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.completed = false;
        for id in self.milestones.ids() {
            let Some(milestone) = self.milestones.get_mut(id) else {
                continue;
            };
            if let Some(range) = milestone.range_mut() {
                range.reset();
            }
            let initial = milestone.initial_trigger_value();
            self.milestones.re_key(id, initial);
            self.milestones.arm(id);
        }
        debug!(
            duration = self.clock.duration(),
            milestones = self.milestones.len(),
            "timer reset"
        );
    }

    /// Advances the clock by the host's frame delta.
    ///
    /// Does nothing while stopped. Otherwise moves the clock, fires every
    /// milestone that became due, emits `Tick`, and emits `Completed` if the
    /// round ran out. `delta` must not be negative.
    pub fn update(&mut self, delta: f64) {
        let Some(step) = self.clock.advance(delta) else {
            return;
        };
        trace!(delta, previous = step.previous, current = step.current, "update");
        self.after_move();
    }

    /// Skips `seconds` ahead, firing milestones on the way if running.
    ///
    /// Negative amounts are ignored. May complete the round.
    pub fn fast_forward(&mut self, seconds: f64) {
        let Some(step) = self.clock.fast_forward(seconds) else {
            return;
        };
        trace!(seconds, previous = step.previous, current = step.current, "fast-forward");
        if self.clock.is_running() {
            self.after_move();
        }
    }

    /// Moves the reading back by `seconds`. Never fires milestones and never
    /// completes the round. Negative amounts are ignored.
    pub fn rewind(&mut self, seconds: f64) {
        if self.clock.rewind(seconds) && self.clock.remaining() > 0.0 {
            self.completed = false;
        }
    }

    /// Changes the round length, clamping the remaining time into it.
    pub fn set_duration(&mut self, duration: f64) {
        if self.clock.set_duration(duration) {
            debug!(duration, "duration changed");
            self.emit(TimerEvent::DurationChanged { duration });
        }
    }

    fn after_move(&mut self) {
        self.run_scheduler();
        self.emit(TimerEvent::Tick(self.snapshot()));
        // A move made from inside a callback leaves completion to the outer pass.
        if self.context.in_pass() {
            return;
        }
        if self.clock.settle() {
            self.completed = true;
            debug!(duration = self.clock.duration(), "timer completed");
            self.emit(TimerEvent::Completed);
        }
    }

    /// Runs one scheduler pass.
    ///
    /// Repeatedly picks the lowest trigger value with at least one due,
    /// unprocessed milestone and fires each of those milestones in turn.
    /// Each iteration scans the live index, so milestones added by a callback
    /// are picked up within the same pass, and a milestone removed by an
    /// earlier callback is skipped. The pass ends early if a callback stops
    /// the timer. A pass started while another is running is dropped.
    fn run_scheduler(&mut self) {
        let Some(_pass) = self.context.enter_pass() else {
            trace!("scheduler pass already running, nested pass suppressed");
            return;
        };
        let mut done: HashSet<(TriggerKey, MilestoneId)> = HashSet::new();
        while self.clock.is_running() {
            let Some((value, due)) = self.next_due(&done) else {
                break;
            };
            trace!(value, count = due.len(), "trigger value due");
            let key = TriggerKey::new(value);
            done.extend(due.iter().map(|id| (key, *id)));
            for id in due {
                if let Some(firing) = self.take_due(id) {
                    self.fire(id, firing);
                }
            }
        }
    }

    /// Finds the lowest bucket holding milestones whose condition holds and
    /// that have not been processed in this pass.
    fn next_due(
        &self,
        done: &HashSet<(TriggerKey, MilestoneId)>,
    ) -> Option<(f64, Vec<MilestoneId>)> {
        self.milestones.buckets().find_map(|(value, ids)| {
            let key = TriggerKey::new(value);
            let due: Vec<MilestoneId> = ids
                .iter()
                .copied()
                .filter(|id| !done.contains(&(key, *id)))
                .filter(|id| {
                    self.milestones.get(*id).is_some_and(|milestone| {
                        let current = self.clock.value_of(milestone.time_type());
                        milestone.should_fire(current, self.epsilon)
                    })
                })
                .collect();
            (!due.is_empty()).then_some((value, due))
        })
    }

    /// Collects the crossings one milestone owes against the live reading.
    ///
    /// A range milestone is moved to its next step here. Retiring an
    /// exhausted milestone is left to `fire`, so a milestone whose callbacks
    /// never ran stays indexed. Returns `None` if the milestone is gone,
    /// disarmed, or no longer due.
    fn take_due(&mut self, id: MilestoneId) -> Option<Firing> {
        let duration = self.clock.duration();
        let epsilon = self.epsilon;
        let milestone = self.milestones.get_mut(id)?;
        if !milestone.is_armed() {
            return None;
        }
        let time_type = milestone.time_type();
        let upper_bound = time_type.upper_bound(duration);
        let current = self.clock.value_of(time_type);
        let due = milestone.should_fire(current, epsilon);
        let trigger_value = milestone.trigger_value();
        let callback = Rc::clone(&milestone.callback);
        let retire = if milestone.is_recurring() {
            Retire::Disarm
        } else {
            Retire::Unregister
        };

        let (values, next) = match milestone.range_mut() {
            Some(range) => {
                let crossed = range.take_crossed(current, upper_bound, epsilon);
                (crossed, range.next_value(epsilon))
            }
            None if due => (vec![trigger_value], None),
            None => return None,
        };

        if let Some(next_value) = next {
            self.milestones.re_key(id, next_value);
        }
        if values.is_empty() {
            if next.is_none() {
                self.retire(id, retire);
            }
            return None;
        }

        let crossings = values
            .into_iter()
            .map(|value| {
                let value = value.clamp(0.0, upper_bound);
                Crossing {
                    time_type,
                    value,
                    remaining: time_type.remaining_at(value, duration).clamp(0.0, duration),
                }
            })
            .collect();
        Some(Firing {
            callback,
            crossings,
            retire: next.is_none().then_some(retire),
        })
    }

    /// Runs a milestone's callback once per crossing, in order.
    ///
    /// The milestone is retired right before its final run, so a one-shot
    /// fires at most once even if that run panics. Remaining runs are
    /// dropped as soon as a callback removes the milestone.
    fn fire(&mut self, id: MilestoneId, firing: Firing) {
        let Firing {
            callback,
            crossings,
            retire,
        } = firing;
        let last = crossings.len().saturating_sub(1);
        for (step, crossing) in crossings.into_iter().enumerate() {
            if !self.milestones.contains(id) {
                trace!(?id, "milestone removed mid-burst, remaining crossings dropped");
                break;
            }
            if step == last {
                if let Some(retire) = retire {
                    self.retire(id, retire);
                }
            }
            self.invoke(id, &callback, crossing);
        }
    }

    fn retire(&mut self, id: MilestoneId, retire: Retire) {
        match retire {
            Retire::Disarm => {
                self.milestones.disarm(id);
            }
            Retire::Unregister => {
                self.milestones.unregister(id);
            }
        }
    }

    fn invoke(&mut self, id: MilestoneId, callback: &MilestoneCallback, crossing: Crossing) {
        trace!(?id, time_type = ?crossing.time_type, value = crossing.value, "milestone fired");
        let _override = self.context.override_with(crossing);
        let mut logic = callback.borrow_mut();
        (&mut *logic)(self);
    }

    fn emit(&self, event: TimerEvent) {
        let listeners: Vec<EventListener> = self.listeners.values().cloned().collect();
        for listener in listeners {
            (&mut *listener.borrow_mut())(&event);
        }
    }
}

// Read accessors.
impl Timer {
    pub fn duration(&self) -> f64 {
        self.clock.duration()
    }

    /// Seconds left in the round.
    ///
    /// Inside a milestone callback this is the value that triggered the
    /// callback, not the clock's true reading.
    pub fn remaining(&self) -> f64 {
        match self.context.crossing() {
            Some(crossing) => crossing.remaining,
            None => self.clock.remaining(),
        }
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

    /// Reads any of the four time quantities, honoring the callback override.
    pub fn value_of(&self, time_type: TimeType) -> f64 {
        match self.context.crossing() {
            Some(crossing) if crossing.time_type == time_type => crossing.value,
            Some(crossing) => time_type.value_at_remaining(crossing.remaining, self.duration()),
            None => self.clock.value_of(time_type),
        }
    }

    /// The crossing that triggered the callback currently running, if any.
    pub fn current_crossing(&self) -> Option<Crossing> {
        self.context.crossing()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Whether the current round ran to zero.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// The underlying time model, without the callback override.
    pub fn clock(&self) -> &TimeModel {
        &self.clock
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from_remaining(self.duration(), self.remaining(), self.is_running())
    }
}

// Public milestone and listener API.
impl Timer {
    /// Registers a milestone that fires when `time_type` reaches
    /// `trigger_value`.
    ///
    /// A one-shot milestone is removed after firing. A recurring one fires
    /// once per round and is re-armed by `reset`.
    pub fn add_milestone(
        &mut self,
        time_type: TimeType,
        trigger_value: f64,
        logic: impl FnMut(&mut Timer) + 'static,
        recurring: bool,
    ) -> Result<MilestoneId, MilestoneError> {
        if !trigger_value.is_finite() {
            return Err(MilestoneError::NonFiniteValue(trigger_value));
        }
        let milestone = Milestone::single(time_type, trigger_value, recurring, callback(logic));
        let id = self.milestones.register(milestone);
        debug!(?id, ?time_type, trigger_value, recurring, "milestone added");
        Ok(id)
    }

    /// Registers a milestone that fires at every `interval` step from
    /// `range_start` to `range_end`, inclusive.
    ///
    /// The bounds may be given in either order; the first step is always the
    /// one reached first in a round. A single large update fires every step
    /// it crossed, in order, each with its own value visible to the callback.
    pub fn add_range_milestone(
        &mut self,
        time_type: TimeType,
        range_start: f64,
        range_end: f64,
        interval: f64,
        logic: impl FnMut(&mut Timer) + 'static,
        recurring: bool,
    ) -> Result<MilestoneId, MilestoneError> {
        for value in [range_start, range_end] {
            if !value.is_finite() {
                return Err(MilestoneError::NonFiniteValue(value));
            }
        }
        if !(interval > 0.0 && interval.is_finite()) {
            return Err(MilestoneError::InvalidInterval(interval));
        }
        let range = RangeMilestone::new(time_type, range_start, range_end, interval);
        let milestone = Milestone::range(range, recurring, callback(logic));
        let id = self.milestones.register(milestone);
        debug!(
            ?id,
            ?time_type,
            range_start,
            range_end,
            interval,
            recurring,
            "range milestone added"
        );
        Ok(id)
    }

    /// One-shot milestone on seconds remaining.
    pub fn on_time_remaining(
        &mut self,
        seconds: f64,
        logic: impl FnMut(&mut Timer) + 'static,
    ) -> Result<MilestoneId, MilestoneError> {
        self.add_milestone(TimeType::TimeRemaining, seconds, logic, false)
    }

    /// One-shot milestone on seconds elapsed.
    pub fn on_time_elapsed(
        &mut self,
        seconds: f64,
        logic: impl FnMut(&mut Timer) + 'static,
    ) -> Result<MilestoneId, MilestoneError> {
        self.add_milestone(TimeType::TimeElapsed, seconds, logic, false)
    }

    /// One-shot milestone on the elapsed fraction of the round.
    pub fn on_progress(
        &mut self,
        fraction: f64,
        logic: impl FnMut(&mut Timer) + 'static,
    ) -> Result<MilestoneId, MilestoneError> {
        self.add_milestone(TimeType::ProgressElapsed, fraction, logic, false)
    }

    /// Removes a milestone. Returns `false` if it was not registered.
    pub fn remove_milestone(&mut self, id: MilestoneId) -> bool {
        let removed = self.milestones.unregister(id).is_some();
        if removed {
            debug!(?id, "milestone removed");
        }
        removed
    }

    pub fn remove_all_milestones(&mut self) {
        debug!(count = self.milestones.len(), "all milestones removed");
        self.milestones.clear();
    }

    /// Removes every milestone for which `predicate` returns `true`.
    /// Returns how many were removed.
    pub fn remove_milestones_where(
        &mut self,
        predicate: impl FnMut(MilestoneId, &Milestone) -> bool,
    ) -> usize {
        let removed = self.milestones.unregister_where(predicate).len();
        debug!(count = removed, "milestones removed by predicate");
        removed
    }

    /// Removes every milestone watching `time_type`.
    pub fn remove_milestones_of_type(&mut self, time_type: TimeType) -> usize {
        self.remove_milestones_where(|_, milestone| milestone.time_type() == time_type)
    }

    /// Removes every milestone of `time_type` that starts at `value`: plain
    /// milestones by trigger value, range milestones by `range_start`.
    pub fn remove_milestones_at(&mut self, time_type: TimeType, value: f64) -> usize {
        let epsilon = self.epsilon;
        self.remove_milestones_where(|_, milestone| {
            milestone.time_type() == time_type
                && (milestone.initial_trigger_value() - value).abs() <= epsilon
        })
    }

    pub fn milestone(&self, id: MilestoneId) -> Option<&Milestone> {
        self.milestones.get(id)
    }

    pub fn milestones(&self) -> impl Iterator<Item = (MilestoneId, &Milestone)> {
        self.milestones.iter()
    }

    /// Number of registered milestones, armed or waiting for a reset.
    pub fn milestone_count(&self) -> usize {
        self.milestones.len()
    }

    /// Registers a listener for every `TimerEvent`.
    pub fn on_event(&mut self, listener: impl FnMut(&TimerEvent) + 'static) -> ListenerId {
        self.listeners.insert(Rc::new(RefCell::new(listener)))
    }

    /// Removes an event listener. Returns `true` if it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }
}
