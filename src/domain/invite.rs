//! Team invites

use serde::{Deserialize, Serialize};

use crate::domain::identity::Npub;
use crate::domain::team::TeamId;

/// Invite identifier as issued by the team directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(String);

impl InviteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for InviteId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for InviteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolution state of an invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Rejected,
    /// Missing, or any status this client does not know about
    #[default]
    #[serde(other)]
    Other,
}

impl InviteStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Invitation to join a team, addressed to one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: InviteId,
    pub team_id: TeamId,
    #[serde(default)]
    pub team_name: String,
    /// Addressee of the invite
    pub invitee_npub: Npub,
    #[serde(default)]
    pub invited_by_name: String,
    #[serde(default)]
    pub status: InviteStatus,
}

impl Invite {
    pub fn new(
        id: InviteId,
        team_id: TeamId,
        team_name: impl Into<String>,
        invitee_npub: Npub,
        invited_by_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            team_id,
            team_name: team_name.into(),
            invitee_npub,
            invited_by_name: invited_by_name.into(),
            status: InviteStatus::Pending,
        }
    }

    pub fn is_addressed_to(&self, user: &Npub) -> bool {
        self.invitee_npub == *user
    }
}

/// The invites still waiting for an answer, in their original order
pub fn pending_invites(invites: &[Invite]) -> Vec<&Invite> {
    invites.iter().filter(|i| i.status.is_pending()).collect()
}
