pub mod config;
pub mod preset;
pub mod spec;
pub mod timer;

pub use config::{Config, RunnerConfig};
pub use preset::Preset;
pub use spec::TimerSpec;
pub use timer::{Timer, TimerStatus};
