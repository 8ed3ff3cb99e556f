use crate::utils;
use serde::{Deserialize, Serialize};

use super::TimerSpec;

/// A reusable timer template; never counts down itself
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub seconds: u64,
    #[serde(default = "preset_marker")]
    pub is_preset: bool,
}

fn preset_marker() -> bool {
    true
}

impl Preset {
    pub fn new(id: u32, name: Option<String>, seconds: u64) -> Self {
        Self {
            id,
            name,
            seconds,
            is_preset: true,
        }
    }

    /// The preset name, or its duration spelled out
    pub fn label(&self) -> String {
        match self.name {
            Some(ref name) if !name.trim().is_empty() => name.clone(),
            _ => utils::format_preset_value(self.seconds),
        }
    }

    pub fn to_spec(&self) -> TimerSpec {
        TimerSpec {
            name: self.name.clone(),
            ..TimerSpec::from_seconds(self.seconds)
        }
    }
}
