//! Member progress domain module

mod curriculum;
mod entry;

pub use curriculum::{
    progress_color, progress_percentage, Curriculum, ProgressColor, TUTORIAL_GROUP,
};
pub use entry::{ProgressEntry, Step};
