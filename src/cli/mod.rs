//! CLI module for lesson-teams
//!
//! Drives the team coordinator against a local directory fixture:
//! - `show`: print the current user's teams and pending invites
//! - `accept` / `reject`: answer an invite
//! - `delete` / `leave`: remove or leave a team, after confirmation
//! - `login`: store the identity the other commands act as

pub mod login;
pub mod teams;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// lesson-teams - Teams, invites and member progress for the lessons app
#[derive(Parser)]
#[command(name = "lesson-teams")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory fixture file (overrides config)
    #[arg(long, global = true)]
    pub fixture: Option<PathBuf>,

    /// Client storage file holding the user identity (overrides config)
    #[arg(long, global = true)]
    pub identity: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Show teams, member progress and pending invites
    Show(teams::ShowArgs),

    /// Accept a pending invite
    Accept {
        /// Invite ID
        invite: String,
    },

    /// Reject a pending invite
    Reject {
        /// Invite ID
        invite: String,
    },

    /// Delete a team you created
    Delete {
        /// Team ID
        team: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Leave a team you joined
    Leave {
        /// Team ID
        team: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Store the identity to act as
    Login(login::LoginArgs),
}

impl Command {
    /// Whether confirmation prompts should be answered with yes
    pub fn assume_yes(&self) -> bool {
        matches!(
            self,
            Self::Delete { yes: true, .. } | Self::Leave { yes: true, .. }
        )
    }
}
