//! Intervals runner library
//!
//! Drives the timers held in an `intervals_core::Store`: one tick loop for
//! the active timer, broadcast events, and the dialog mirror used by front-ends.

pub mod dialog;
pub mod timer;

pub use dialog::{Dialog, use_dialog};
pub use timer::{RunnerError, Step, TimerEvent, TimerEventType, TimerRunner};
