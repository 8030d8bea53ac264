//! Lesson sequence and progress display helpers

use serde::{Deserialize, Serialize};

use super::entry::Step;

/// Group identifier of the introductory lessons
pub const TUTORIAL_GROUP: &str = "tutorial";

/// Lesson groups of the English track as (group, number of steps)
const ENGLISH_TRACK: &[(&str, usize)] = &[
    (TUTORIAL_GROUP, 8),
    ("1", 20),
    ("2", 21),
    ("3", 21),
    ("4", 21),
    ("5", 21),
    ("6", 21),
];

/// Colour scheme of a member's progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProgressColor {
    Gray,
    #[default]
    Pink,
    Cyan,
    Blue,
    Teal,
    Green,
}

impl ProgressColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gray => "gray",
            Self::Pink => "pink",
            Self::Cyan => "cyan",
            Self::Blue => "blue",
            Self::Teal => "teal",
            Self::Green => "green",
        }
    }
}

impl std::fmt::Display for ProgressColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress bar colour for a lesson group; unknown or missing groups are pink
pub fn progress_color(group: Option<&str>) -> ProgressColor {
    match group {
        Some(TUTORIAL_GROUP) => ProgressColor::Gray,
        Some("1") | Some("2") => ProgressColor::Pink,
        Some("3") => ProgressColor::Cyan,
        Some("4") => ProgressColor::Blue,
        Some("5") => ProgressColor::Teal,
        Some("6") => ProgressColor::Green,
        _ => ProgressColor::default(),
    }
}

/// Progress through a track in percent; 0 for non-numeric or missing steps
pub fn progress_percentage(step: Option<&Step>, total_steps: usize) -> f64 {
    if total_steps == 0 {
        return 0.0;
    }

    step.and_then(Step::as_number)
        .map(|value| value / total_steps as f64 * 100.0)
        .unwrap_or(0.0)
}

/// Fixed, ordered lesson sequence of a language track
#[derive(Debug, Clone, PartialEq)]
pub struct Curriculum {
    groups: Vec<String>,
}

impl Curriculum {
    /// Build a track from the group identifier of every step, in order
    pub fn new(groups: Vec<String>) -> Self {
        Self { groups }
    }

    /// Build a track from consecutive (group, step count) segments
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = (&'a str, usize)>) -> Self {
        let groups = segments
            .into_iter()
            .flat_map(|(group, count)| std::iter::repeat_n(group.to_string(), count))
            .collect();

        Self { groups }
    }

    /// The English track
    pub fn english() -> Self {
        Self::from_segments(ENGLISH_TRACK.iter().copied())
    }

    /// Look up a track by language code
    pub fn for_language(language: &str) -> Option<Self> {
        match language {
            "en" => Some(Self::english()),
            _ => None,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.groups.len()
    }

    /// Lesson group of a step; `None` for labels and out-of-range steps
    pub fn group_for_step(&self, step: Option<&Step>) -> Option<&str> {
        let index = step.and_then(Step::as_index)?;
        self.groups.get(index).map(String::as_str)
    }

    pub fn color_for_step(&self, step: Option<&Step>) -> ProgressColor {
        progress_color(self.group_for_step(step))
    }

    pub fn percentage_for_step(&self, step: Option<&Step>) -> f64 {
        progress_percentage(step, self.total_steps())
    }
}

impl Default for Curriculum {
    fn default() -> Self {
        Self::english()
    }
}
