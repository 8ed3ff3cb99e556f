//! Timer input as entered by the user

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Hours, minutes and seconds as typed, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default)]
    pub repeat: Option<u32>,
}

impl TimerSpec {
    pub fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = Some(repeat);
        self
    }

    /// Saturates at `u64::MAX`; see [`TimerSpec::checked_total_seconds`]
    pub fn total_seconds(&self) -> u64 {
        self.checked_total_seconds().unwrap_or(u64::MAX)
    }

    /// `None` when the components overflow `u64`
    pub fn checked_total_seconds(&self) -> Option<u64> {
        self.hours
            .checked_mul(3600)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)
    }
}

/// Parses `[NAME=]DURATION[xREPEAT]`, e.g. `Squat=45s`, `Plank=1m30sx3` or `90`.
impl FromStr for TimerSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        let (name, rest) = match s.split_once('=') {
            Some((name, rest)) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(Error::Validation("Timer name cannot be empty".to_string()));
                }
                (Some(name.to_string()), rest.trim())
            }
            None => (None, s),
        };

        let (duration, repeat) = match rest.rsplit_once('x') {
            Some((duration, repeat)) => {
                let repeat: u32 = repeat.trim().parse().map_err(|_| {
                    Error::Validation(format!("Invalid repeat count '{}'", repeat))
                })?;
                if repeat == 0 {
                    return Err(Error::Validation(
                        "Repeat count must be greater than 0".to_string(),
                    ));
                }
                (duration.trim(), Some(repeat))
            }
            None => (rest, None),
        };

        let mut spec = parse_duration(duration)?;
        let total = spec.checked_total_seconds().ok_or_else(|| {
            Error::Validation(format!("Timer duration '{}' is too long", duration))
        })?;
        if total == 0 {
            return Err(Error::Validation(
                "Timer duration must be greater than 0".to_string(),
            ));
        }

        spec.name = name;
        spec.repeat = repeat;
        Ok(spec)
    }
}

fn parse_duration(input: &str) -> Result<TimerSpec> {
    if input.is_empty() {
        return Err(Error::Validation("Timer duration cannot be empty".to_string()));
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        let seconds = input
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid duration '{}'", input)))?;
        return Ok(TimerSpec::from_seconds(seconds));
    }

    let mut spec = TimerSpec::default();
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid duration '{}'", input)))?;
        digits.clear();

        match c.to_ascii_lowercase() {
            'h' => spec.hours = value,
            'm' => spec.minutes = value,
            's' => spec.seconds = value,
            unit => {
                return Err(Error::Validation(format!(
                    "Unknown duration unit '{}' in '{}'",
                    unit, input
                )));
            }
        }
    }

    if !digits.is_empty() {
        return Err(Error::Validation(format!(
            "Missing unit after '{}' in '{}'",
            digits, input
        )));
    }

    Ok(spec)
}
