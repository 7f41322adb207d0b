//! Per-timer scheduling state that must survive callbacks unwinding.
//!
//! Two pieces of state are scoped to a running scheduler pass: the
//! reentrancy flag and the value override a callback reads instead of the
//! clock's true reading. Both are entered through guards that restore the
//! prior state when dropped, including during a panic in a callback.

use crate::common::TimeType;
use std::cell::Cell;
use std::rc::Rc;

/// The value that caused one callback invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// The time quantity the milestone watches.
    pub time_type: TimeType,
    /// The crossed value in units of `time_type`.
    pub value: f64,
    /// The same moment expressed as seconds remaining.
    pub remaining: f64,
}

/// Transient scheduling state owned by a single timer.
#[derive(Debug, Clone, Default)]
pub struct CallbackContext {
    crossing: Rc<Cell<Option<Crossing>>>,
    in_pass: Rc<Cell<bool>>,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The crossing callbacks currently observe instead of the clock, if any.
    pub fn crossing(&self) -> Option<Crossing> {
        self.crossing.get()
    }

    /// Whether a scheduler pass is in progress.
    pub fn in_pass(&self) -> bool {
        self.in_pass.get()
    }

    /// Marks a scheduler pass as started.
    ///
    /// Returns `None` if a pass is already running, in which case the caller
    /// must not start another.
    pub fn enter_pass(&self) -> Option<PassGuard> {
        if self.in_pass.replace(true) {
            return None;
        }
        Some(PassGuard {
            flag: Rc::clone(&self.in_pass),
        })
    }

    /// Makes time reads report `crossing` until the guard drops.
    pub fn override_with(&self, crossing: Crossing) -> OverrideGuard {
        let prior = self.crossing.replace(Some(crossing));
        OverrideGuard {
            slot: Rc::clone(&self.crossing),
            prior,
        }
    }
}

/// Clears the reentrancy flag when dropped.
#[must_use = "the pass ends as soon as the guard is dropped"]
pub struct PassGuard {
    flag: Rc<Cell<bool>>,
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Restores the previous override (or none) when dropped.
#[must_use = "the override is removed as soon as the guard is dropped"]
pub struct OverrideGuard {
    slot: Rc<Cell<Option<Crossing>>>,
    prior: Option<Crossing>,
}

impl Drop for OverrideGuard {
    fn drop(&mut self) {
        self.slot.set(self.prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn at(remaining: f64) -> Crossing {
        Crossing {
            time_type: TimeType::TimeRemaining,
            value: remaining,
            remaining,
        }
    }

    #[test]
    fn nested_overrides_restore_in_order() {
        let context = CallbackContext::new();
        {
            let _outer = context.override_with(at(5.0));
            {
                let _inner = context.override_with(at(4.0));
                assert_eq!(context.crossing(), Some(at(4.0)));
            }
            assert_eq!(context.crossing(), Some(at(5.0)));
        }
        assert_eq!(context.crossing(), None);
    }

    #[test]
    fn second_pass_is_refused_until_the_first_ends() {
        let context = CallbackContext::new();
        let guard = context.enter_pass();
        assert!(guard.is_some());
        assert!(context.enter_pass().is_none());
        drop(guard);
        assert!(!context.in_pass());
        assert!(context.enter_pass().is_some());
    }

    #[test]
    fn guards_restore_state_on_panic() {
        let context = CallbackContext::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _pass = context.enter_pass();
            let _value = context.override_with(at(1.0));
            panic!("callback failed");
        }));
        assert!(result.is_err());
        assert!(!context.in_pass());
        assert_eq!(context.crossing(), None);
    }
}
