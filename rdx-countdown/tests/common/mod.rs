//! Shared helpers for the integration tests.
#![allow(dead_code)]

use countdown::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub type Log = Rc<RefCell<Vec<f64>>>;
pub type Counter = Rc<Cell<u32>>;
pub type EventLog = Rc<RefCell<Vec<TimerEvent>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn counter() -> Counter {
    Rc::new(Cell::new(0))
}

/// A callback that records the timer's reading of `time_type` when it runs.
pub fn record(log: &Log, time_type: TimeType) -> impl FnMut(&mut Timer) + 'static {
    let log = Rc::clone(log);
    move |timer| log.borrow_mut().push(timer.value_of(time_type))
}

/// A callback that records the remaining time when it runs.
pub fn record_remaining(log: &Log) -> impl FnMut(&mut Timer) + 'static {
    record(log, TimeType::TimeRemaining)
}

/// A callback that counts its invocations.
pub fn count(counter: &Counter) -> impl FnMut(&mut Timer) + 'static {
    let counter = Rc::clone(counter);
    move |_| counter.set(counter.get() + 1)
}

/// Captures every event the timer emits from now on.
pub fn capture_events(timer: &mut Timer) -> EventLog {
    let events: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    timer.on_event(move |event| sink.borrow_mut().push(*event));
    events
}

/// Events other than `Tick`, which most tests don't care about.
pub fn lifecycle(events: &EventLog) -> Vec<TimerEvent> {
    events
        .borrow()
        .iter()
        .copied()
        .filter(|event| !matches!(event, TimerEvent::Tick(_)))
        .collect()
}

pub fn completions(events: &EventLog) -> usize {
    events
        .borrow()
        .iter()
        .filter(|event| matches!(event, TimerEvent::Completed))
        .count()
}

/// A `TimeStore` owned by the test, optionally read-only.
#[derive(Clone)]
pub struct SharedStore {
    pub value: Rc<Cell<f64>>,
    pub writable: bool,
}

impl SharedStore {
    pub fn read_only(initial: f64) -> Self {
        Self {
            value: Rc::new(Cell::new(initial)),
            writable: false,
        }
    }
}

impl TimeStore for SharedStore {
    fn remaining(&self) -> f64 {
        self.value.get()
    }

    fn set_remaining(&mut self, value: f64) {
        self.value.set(value);
    }

    fn can_set(&self) -> bool {
        self.writable
    }
}
