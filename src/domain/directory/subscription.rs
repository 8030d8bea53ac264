//! Push subscriptions of the team directory

use std::sync::Arc;

use crate::domain::identity::Npub;
use crate::domain::invite::Invite;
use crate::domain::team::{Team, TeamId};

/// What a subscriber wants to be told about
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    /// Every change to the invites addressed to `user`
    Invites { user: Npub },
    /// Every change to `team`, as seen by `user`
    Team { user: Npub, team: TeamId },
}

impl SubscriptionKey {
    pub fn invites(user: Npub) -> Self {
        Self::Invites { user }
    }

    pub fn team(user: Npub, team: TeamId) -> Self {
        Self::Team { user, team }
    }

    pub fn user(&self) -> &Npub {
        match self {
            Self::Invites { user } | Self::Team { user, .. } => user,
        }
    }
}

/// A change pushed by the directory
#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryEvent {
    /// Full, current invite list of the subscribed user
    Invites(Vec<Invite>),
    /// New state of a team; `None` once the team is gone
    Team { team_id: TeamId, team: Option<Team> },
}

/// Callback invoked for every pushed event
pub type EventHandler = Arc<dyn Fn(DirectoryEvent) + Send + Sync>;

/// Handle of an active subscription
///
/// Cancelling is idempotent. Dropping an active token cancels it.
pub struct CancelToken {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl CancelToken {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Token for a subscription that needs no teardown
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for CancelToken {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("active", &self.is_active())
            .finish()
    }
}
