//! Timer events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event emitted by the runner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimerEvent {
    pub event_type: TimerEventType,
    pub timer_id: u32,
    pub timestamp: DateTime<Utc>,
}

/// Types of timer events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventType {
    /// Timer became the active one
    Started { seconds: u64, round: u32 },
    /// One second counted down
    Tick {
        remaining_seconds: u64,
        progress: f64,
    },
    Paused { remaining_seconds: u64 },
    Resumed,
    /// A round of a repeating timer ran out and the next one began
    RoundCompleted { round: u32, of: u32 },
    /// Timer ran out with no rounds left
    Completed,
    /// Moved on to the next timer in the list
    Advanced { next_id: u32 },
    /// Stopped before running out
    Stopped,
    /// Nothing left to run
    SequenceFinished,
}

impl TimerEvent {
    pub fn new(event_type: TimerEventType, timer_id: u32) -> Self {
        Self {
            event_type,
            timer_id,
            timestamp: Utc::now(),
        }
    }

    pub fn started(timer_id: u32, seconds: u64, round: u32) -> Self {
        Self::new(TimerEventType::Started { seconds, round }, timer_id)
    }

    pub fn tick(timer_id: u32, remaining_seconds: u64, progress: f64) -> Self {
        Self::new(
            TimerEventType::Tick {
                remaining_seconds,
                progress,
            },
            timer_id,
        )
    }

    pub fn round_completed(timer_id: u32, round: u32, of: u32) -> Self {
        Self::new(TimerEventType::RoundCompleted { round, of }, timer_id)
    }

    /// Whether no more events follow for this run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.event_type,
            TimerEventType::SequenceFinished | TimerEventType::Stopped
        )
    }
}
