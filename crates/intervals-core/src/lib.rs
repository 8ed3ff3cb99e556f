//! Interval timer core: timers, presets, the store that owns them, and the
//! helpers that build and format them.

pub mod error;
pub mod models;
pub mod storage;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
pub use models::{Config, Preset, RunnerConfig, Timer, TimerSpec, TimerStatus};
pub use store::{SharedStore, Store};
