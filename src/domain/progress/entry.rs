//! Member progress entries

use serde::{Deserialize, Serialize};

use crate::domain::identity::Npub;

/// Current lesson step of a member
///
/// The directory stores whatever the client last wrote, so a step may be a
/// number or an arbitrary label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Number(f64),
    Label(String),
}

impl Step {
    /// Numeric value of the step, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Position in the lesson sequence, for whole non-negative numbers only
    pub fn as_index(&self) -> Option<usize> {
        self.as_number()
            .filter(|value| *value >= 0.0 && value.fract() == 0.0)
            .map(|value| value as usize)
    }
}

impl From<u32> for Step {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Step {
    fn from(value: &str) -> Self {
        Self::Label(value.to_string())
    }
}

/// Snapshot of one member's lesson progress, display only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    pub npub: Npub,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_creator: bool,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub answered_steps_count: u32,
    #[serde(default)]
    pub step: Option<Step>,
}

impl ProgressEntry {
    pub fn new(npub: Npub, name: impl Into<String>) -> Self {
        Self {
            npub,
            name: name.into(),
            is_creator: false,
            streak: 0,
            answered_steps_count: 0,
            step: None,
        }
    }

    pub fn with_step(mut self, step: impl Into<Step>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn with_streak(mut self, streak: u32) -> Self {
        self.streak = streak;
        self
    }

    pub fn with_answered_steps(mut self, count: u32) -> Self {
        self.answered_steps_count = count;
        self
    }

    pub fn as_creator(mut self) -> Self {
        self.is_creator = true;
        self
    }
}
