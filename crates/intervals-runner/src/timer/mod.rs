pub mod engine;
pub mod events;

pub use engine::{RunnerError, Step, TimerRunner};
pub use events::{TimerEvent, TimerEventType};
