//! The building blocks of the milestone engine.

pub mod context;
pub mod index;
pub mod milestone;
