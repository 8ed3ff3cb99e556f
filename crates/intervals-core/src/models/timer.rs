use crate::{Error, Result, utils};
use serde::{Deserialize, Serialize};

/// A countdown with a fixed duration and the live remaining value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Total duration in seconds
    pub seconds: u64,
    /// Seconds left on the countdown, always within `0..=seconds`
    pub current_value: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<u32>,
    #[serde(default)]
    pub repeat_counter: u32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerStatus {
    pub is_active: bool,
    pub is_done: bool,
}

impl Timer {
    /// Validate the countdown bounds
    pub fn validate(&self) -> Result<()> {
        if self.current_value > self.seconds {
            return Err(Error::InvalidData(format!(
                "Timer {} has {}s left of a {}s duration",
                self.id, self.current_value, self.seconds
            )));
        }
        Ok(())
    }

    pub fn toggle(&mut self) {
        self.is_active = !self.is_active;
    }

    /// Count down by one second
    pub fn tick(&mut self) -> Result<()> {
        if self.current_value == 0 {
            return Err(Error::InvalidData(format!(
                "Timer {} has already run out",
                self.id
            )));
        }

        self.current_value -= 1;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current_value = self.seconds;
        self.is_done = false;
    }

    pub fn set_done(&mut self, status: bool) {
        self.is_done = status;
    }

    pub fn increase_repeat_counter(&mut self) {
        self.repeat_counter += 1;
    }

    /// Back to the first round
    pub fn reset_repeat_counter(&mut self) {
        self.repeat_counter = 1;
    }

    /// Whether another round should run after the current one
    pub fn has_rounds_left(&self) -> bool {
        self.repeat
            .is_some_and(|repeat| self.repeat_counter < repeat)
    }

    pub fn is_finished(&self) -> bool {
        self.current_value == 0
    }

    /// Remaining share of the duration as a percentage
    pub fn progress(&self) -> f64 {
        if self.seconds == 0 {
            return 0.0;
        }

        self.current_value as f64 / self.seconds as f64 * 100.0
    }

    /// Remaining time as `HH:MM:SS`
    pub fn formatted_value(&self) -> String {
        utils::format_clock(self.current_value)
    }

    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            is_active: self.is_active,
            is_done: self.is_done,
        }
    }

    /// Display name, falling back to the id
    pub fn label(&self) -> String {
        match self.name {
            Some(ref name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Timer {}", self.id),
        }
    }
}
