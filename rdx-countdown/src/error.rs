//! Errors returned when registering milestones.

use thiserror::Error;

/// A milestone could not be registered.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MilestoneError {
    /// A trigger value or range bound was NaN or infinite.
    #[error("milestone value must be finite, got {0}")]
    NonFiniteValue(f64),
    /// A range interval was zero, negative or not finite.
    #[error("range interval must be a positive finite number, got {0}")]
    InvalidInterval(f64),
}
