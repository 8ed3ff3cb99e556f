//! Builders and formatters shared by the store and its callers

use chrono::{NaiveTime, Timelike};
use std::time::Duration;

use crate::models::{Timer, TimerSpec};

const SECONDS_PER_DAY: u64 = 86_400;

/// Normalize a spec into a fresh, inactive timer with the given id
pub fn prepare_timer(spec: &TimerSpec, id: u32) -> Timer {
    let seconds = spec.total_seconds();

    Timer {
        id,
        name: spec.name.clone(),
        seconds,
        current_value: seconds,
        repeat: spec.repeat,
        repeat_counter: 0,
        is_active: false,
        is_done: false,
    }
}

/// Clock-face time of day for a second count, wrapping every 24 hours
fn clock(seconds: u64) -> NaiveTime {
    let secs = (seconds % SECONDS_PER_DAY) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or_default()
}

/// `HH:MM:SS`, wrapping every 24 hours
pub fn format_clock(seconds: u64) -> String {
    clock(seconds).format("%H:%M:%S").to_string()
}

/// Spell a duration out as `H HOURS M MIN S SEC`.
///
/// Zero components become empty strings but keep their separator, so
/// `30` renders as `"  30 SEC"`.
pub fn format_preset_value(seconds: u64) -> String {
    let time = clock(seconds);

    let hours = match time.hour() {
        0 => String::new(),
        h => format!("{} HOURS", h),
    };
    let minutes = match time.minute() {
        0 => String::new(),
        m => format!("{} MIN", m),
    };
    let secs = match time.second() {
        0 => String::new(),
        s => format!("{} SEC", s),
    };

    format!("{} {} {}", hours, minutes, secs)
}

/// Suspend the caller for `ms` milliseconds
pub async fn delay(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
