//! Coordinator state cache and action bookkeeping

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::Serialize;

use crate::domain::{pending_invites, Invite, InviteId, ProgressEntry, Team, TeamId};

/// Local copy of what the directory last told us
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub teams: Vec<Team>,
    pub invites: Vec<Invite>,
    pub progress: HashMap<TeamId, Vec<ProgressEntry>>,
    pub loading: bool,
}

impl CoordinatorState {
    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id() == id)
    }

    pub fn invite(&self, id: &InviteId) -> Option<&Invite> {
        self.invites.iter().find(|i| i.id == *id)
    }

    pub fn pending_invites(&self) -> Vec<&Invite> {
        pending_invites(&self.invites)
    }

    /// Replace the team with the same ID; unknown teams are ignored
    pub fn replace_team(&mut self, team: Team) -> bool {
        match self.teams.iter_mut().find(|t| t.id() == team.id()) {
            Some(existing) => {
                *existing = team;
                true
            }
            None => false,
        }
    }

    /// Drop a team and its progress entries
    pub fn remove_team(&mut self, id: &TeamId) -> Option<Team> {
        let index = self.teams.iter().position(|t| t.id() == id)?;
        self.progress.remove(id);
        Some(self.teams.remove(index))
    }
}

/// Target of a state-changing action, used for double-submit protection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKey {
    Invite(InviteId),
    Team(TeamId),
}

/// Result of a coordinator action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The directory accepted the request
    Completed,
    /// The directory refused or could not be reached; the user was notified
    Failed,
    /// The same action is already running; nothing was sent
    InFlight,
    /// The user declined the confirmation prompt; nothing was sent
    Declined,
    /// Unknown target or the user may not do this; nothing was sent
    Unavailable,
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::InFlight => write!(f, "in flight"),
            Self::Declined => write!(f, "declined"),
            Self::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Set of actions currently running
#[derive(Debug, Default)]
pub struct InFlightActions {
    keys: Mutex<HashSet<ActionKey>>,
}

impl InFlightActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as running; `None` if it already is
    pub fn try_begin(&self, key: ActionKey) -> Option<InFlightGuard<'_>> {
        let mut keys = self.keys.lock().unwrap_or_else(|p| p.into_inner());

        if !keys.insert(key.clone()) {
            return None;
        }

        Some(InFlightGuard { actions: self, key })
    }

    pub fn contains(&self, key: &ActionKey) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_empty()
    }
}

/// Clears its key when dropped, whatever the action's outcome
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    actions: &'a InFlightActions,
    key: ActionKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut keys = self
            .actions
            .keys
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        keys.remove(&self.key);
    }
}
