//! lesson-teams
//!
//! Team membership coordinator for the lessons app:
//! - Teams the user created or joined, with member progress bars
//! - Pending invites, accepted or rejected from the team screen
//! - Live updates pushed by the team directory
//! - Delete / leave actions behind a confirmation prompt

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use infrastructure::team::{ActionOutcome, TeamCoordinator, TeamSnapshot};
