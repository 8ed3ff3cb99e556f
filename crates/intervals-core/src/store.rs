//! The state store: timers, presets and the timer currently being edited.
//!
//! Lookups return `Option`. Mutations on an unknown id fail with
//! [`Error::TimerNotFound`] or [`Error::PresetNotFound`] and leave the
//! store untouched.
//!
//! New ids are `max(existing) + 1`. Ids freed by deletion are not reused
//! while a higher id exists, but deleting the highest id lets it come back.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{Config, Preset, Timer, TimerSpec, TimerStatus};
use crate::{Error, Result, utils};

/// Store shared between the runner and its callers
pub type SharedStore = Arc<RwLock<Store>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default)]
    pub popular: Vec<u64>,
    #[serde(default)]
    presets: Vec<Preset>,
    #[serde(default)]
    timers: Vec<Timer>,
    #[serde(default)]
    timer_in_editor: Option<u32>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            popular: config.popular.clone(),
            ..Self::default()
        }
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn timer(&self, id: u32) -> Option<&Timer> {
        self.timers.iter().find(|timer| timer.id == id)
    }

    pub fn preset(&self, id: u32) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    fn timer_mut(&mut self, id: u32) -> Result<&mut Timer> {
        self.timers
            .iter_mut()
            .find(|timer| timer.id == id)
            .ok_or(Error::TimerNotFound(id))
    }

    fn timer_index(&self, id: u32) -> Result<usize> {
        self.timers
            .iter()
            .position(|timer| timer.id == id)
            .ok_or(Error::TimerNotFound(id))
    }

    fn require_timer(&self, id: u32) -> Result<&Timer> {
        self.timer(id).ok_or(Error::TimerNotFound(id))
    }

    /// First timer flagged active
    pub fn active_timer(&self) -> Option<&Timer> {
        self.timers.iter().find(|timer| timer.is_active)
    }

    pub fn timer_status(&self, id: u32) -> Result<TimerStatus> {
        Ok(self.require_timer(id)?.status())
    }

    pub fn timer_progress(&self, id: u32) -> Result<f64> {
        Ok(self.require_timer(id)?.progress())
    }

    pub fn timer_formatted_value(&self, id: u32) -> Result<String> {
        Ok(self.require_timer(id)?.formatted_value())
    }

    pub fn new_timer_id(&self) -> Result<u32> {
        next_id(self.timers.iter().map(|timer| timer.id))
    }

    pub fn new_preset_id(&self) -> Result<u32> {
        next_id(self.presets.iter().map(|preset| preset.id))
    }

    /// Check every timer's bounds and that no id appears twice
    pub fn validate(&self) -> Result<()> {
        validate_timers(&self.timers)?;

        let mut seen = HashSet::new();
        for preset in &self.presets {
            if !seen.insert(preset.id) {
                return Err(Error::DuplicateId(preset.id));
            }
        }

        if let Some(id) = self.timer_in_editor {
            self.require_timer(id)?;
        }

        Ok(())
    }

    /// The timer after `id` in list order, if any
    pub fn next_timer(&self, id: u32) -> Result<Option<&Timer>> {
        let index = self.timer_index(id)?;
        Ok(self.timers.get(index + 1))
    }

    pub fn repeat_status(&self, id: u32) -> Result<u32> {
        Ok(self.require_timer(id)?.repeat_counter)
    }

    pub fn timer_in_editor(&self) -> Option<&Timer> {
        self.timer_in_editor.and_then(|id| self.timer(id))
    }

    pub fn add_timer(&mut self, timer: Timer) -> Result<()> {
        timer.validate()?;
        if self.timer(timer.id).is_some() {
            return Err(Error::DuplicateId(timer.id));
        }

        self.timers.push(timer);
        Ok(())
    }

    pub fn add_preset(&mut self, preset: Preset) -> Result<()> {
        if self.preset(preset.id).is_some() {
            return Err(Error::DuplicateId(preset.id));
        }

        self.presets.push(preset);
        Ok(())
    }

    /// Build a timer from `spec` under a fresh id and append it
    pub fn create_timer(&mut self, spec: &TimerSpec) -> Result<u32> {
        let id = self.new_timer_id()?;
        self.add_timer(utils::prepare_timer(spec, id))?;
        Ok(id)
    }

    pub fn create_preset(&mut self, name: Option<String>, seconds: u64) -> Result<u32> {
        let id = self.new_preset_id()?;
        self.add_preset(Preset::new(id, name, seconds))?;
        Ok(id)
    }

    pub fn toggle_timer(&mut self, id: u32) -> Result<()> {
        self.timer_mut(id)?.toggle();
        Ok(())
    }

    pub fn tick_timer(&mut self, id: u32) -> Result<()> {
        self.timer_mut(id)?.tick()
    }

    pub fn reset_timer(&mut self, id: u32) -> Result<()> {
        self.timer_mut(id)?.reset();
        Ok(())
    }

    pub fn delete_timer(&mut self, id: u32) -> Result<Timer> {
        let index = self.timer_index(id)?;

        if self.timer_in_editor == Some(id) {
            self.timer_in_editor = None;
        }

        Ok(self.timers.remove(index))
    }

    pub fn delete_preset(&mut self, id: u32) -> Result<Preset> {
        let index = self
            .presets
            .iter()
            .position(|preset| preset.id == id)
            .ok_or(Error::PresetNotFound(id))?;

        Ok(self.presets.remove(index))
    }

    pub fn set_done_status(&mut self, id: u32, status: bool) -> Result<()> {
        self.timer_mut(id)?.set_done(status);
        Ok(())
    }

    /// Point the editor at a timer, or clear it with `None`
    pub fn set_timer_in_editor(&mut self, id: Option<u32>) -> Result<()> {
        if let Some(id) = id {
            self.require_timer(id)?;
        }

        self.timer_in_editor = id;
        Ok(())
    }

    pub fn remove_timer_in_editor(&mut self) {
        self.timer_in_editor = None;
    }

    /// Replace the timer with the same id, keeping its position
    pub fn update_timer(&mut self, timer: Timer) -> Result<()> {
        timer.validate()?;
        let index = self.timer_index(timer.id)?;
        self.timers[index] = timer;
        Ok(())
    }

    /// Replace the whole timer list, e.g. after reordering
    pub fn update_timers(&mut self, timers: Vec<Timer>) -> Result<()> {
        validate_timers(&timers)?;
        self.timers = timers;

        if let Some(id) = self.timer_in_editor {
            if self.timer(id).is_none() {
                self.timer_in_editor = None;
            }
        }
        Ok(())
    }

    pub fn increase_repeat_counter(&mut self, id: u32) -> Result<()> {
        self.timer_mut(id)?.increase_repeat_counter();
        Ok(())
    }

    pub fn reset_repeat_counter(&mut self, id: u32) -> Result<()> {
        self.timer_mut(id)?.reset_repeat_counter();
        Ok(())
    }

    /// Make `id` the only active timer
    pub fn activate_exclusive(&mut self, id: u32) -> Result<()> {
        self.require_timer(id)?;

        for timer in &mut self.timers {
            timer.is_active = timer.id == id;
        }
        Ok(())
    }
}

fn next_id(ids: impl Iterator<Item = u32>) -> Result<u32> {
    match ids.max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| Error::InvalidData(format!("No id left after {}", max))),
    }
}

fn validate_timers(timers: &[Timer]) -> Result<()> {
    let mut seen = HashSet::new();
    for timer in timers {
        timer.validate()?;
        if !seen.insert(timer.id) {
            return Err(Error::DuplicateId(timer.id));
        }
    }
    Ok(())
}
