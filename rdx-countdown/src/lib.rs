//! # Countdown
//!
//! A countdown/count-up timer with a milestone scheduling engine.
//!
//! The timer itself is simple: a duration and a remaining-time reading that
//! the host moves forward with `update`. The interesting part is the set of
//! milestones attached to it, callbacks that fire when the elapsed time, the
//! remaining time or the progress fraction crosses a threshold.
//!
//! ## Core Concepts
//!
//! - **TimeModel**: Duration, running flag and the remaining-time reading,
//!   optionally stored in an external `TimeStore`.
//! - **Milestones**: Fire once when a `TimeType` reaches a trigger value.
//!   One-shot milestones are removed after firing; recurring ones are re-armed
//!   by every `reset`.
//! - **Range milestones**: Fire at every interval step between two bounds.
//!   A single large update fires every step it crossed, in order.
//! - **Trigger scheduler**: Runs after every clock move and keeps firing the
//!   lowest due trigger value until nothing else is due. Callbacks may add or
//!   remove milestones, including themselves, mid-pass.
//! - **Value override**: While a callback runs, the timer reports the exact
//!   value that triggered it rather than the clock's latest reading.
//!
//! ## Example Usage
//!
//! ```rust
//! use countdown::prelude::*;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! # fn main() -> Result<(), countdown::error::MilestoneError> {
//! let mut timer = Timer::new(10.0);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = Rc::clone(&seen);
//! timer.add_range_milestone(
//!     TimeType::TimeRemaining,
//!     5.0,
//!     1.0,
//!     1.0,
//!     move |timer| log.borrow_mut().push(timer.remaining()),
//!     false,
//! )?;
//!
//! timer.start();
//! timer.update(9.5);
//! assert_eq!(*seen.borrow(), vec![5.0, 4.0, 3.0, 2.0, 1.0]);
//! # Ok(())
//! # }
//! ```

pub const ENGINE_NAME: &str = "Countdown Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Declare all the modules in the crate.
pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod time;

/// A prelude module for easy importing of the most common countdown types.
pub mod prelude {
    pub use crate::common::{ListenerId, MilestoneId, TimeType};
    pub use crate::components::context::Crossing;
    pub use crate::components::milestone::{Milestone, MilestoneKind, RangeMilestone};
    pub use crate::config::{ClockResolution, TimerConfig};
    pub use crate::engine::Timer;
    pub use crate::error::MilestoneError;
    pub use crate::events::{TimerEvent, TimerSnapshot};
    pub use crate::time::{LocalStore, TimeModel, TimeStore};
}
