//! Team entity and related types

use serde::{Deserialize, Serialize};

use super::validation::{validate_team_id, validate_team_name, TeamValidationError};
use crate::domain::identity::Npub;

/// Team identifier as issued by the team directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TeamId(String);

impl TeamId {
    /// Create a new TeamId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, TeamValidationError> {
        let id = id.into();
        validate_team_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TeamId {
    type Error = TeamValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TeamId> for String {
    fn from(id: TeamId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership status of a team member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    /// Invited, not yet answered
    #[default]
    Pending,
    /// Joined the team
    Accepted,
}

impl MemberStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
        }
    }
}

/// A member entry of a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub npub: Npub,
    pub status: MemberStatus,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_creator: bool,
}

impl Member {
    pub fn pending(npub: Npub, name: impl Into<String>) -> Self {
        Self {
            npub,
            status: MemberStatus::Pending,
            name: name.into(),
            is_creator: false,
        }
    }

    pub fn accepted(npub: Npub, name: impl Into<String>) -> Self {
        Self {
            status: MemberStatus::Accepted,
            ..Self::pending(npub, name)
        }
    }
}

/// Team as published by the team directory
///
/// The creator is never part of `members` as an accepted entry, so display
/// counts always add one for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    id: TeamId,
    team_name: String,
    created_by: Npub,
    /// Creator flag relative to the user the team was fetched for
    #[serde(default)]
    is_creator: bool,
    #[serde(default)]
    members: Vec<Member>,
}

impl Team {
    /// Create a new team without members
    pub fn new(
        id: TeamId,
        team_name: impl Into<String>,
        created_by: Npub,
    ) -> Result<Self, TeamValidationError> {
        let team_name = team_name.into();
        validate_team_name(&team_name)?;

        Ok(Self {
            id,
            team_name,
            created_by,
            is_creator: false,
            members: Vec::new(),
        })
    }

    /// Set members (builder pattern)
    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    /// Set the directory's creator flag (builder pattern)
    pub fn with_creator_flag(mut self, is_creator: bool) -> Self {
        self.is_creator = is_creator;
        self
    }

    // Getters

    pub fn id(&self) -> &TeamId {
        &self.id
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn created_by(&self) -> &Npub {
        &self.created_by
    }

    pub fn creator_flag(&self) -> bool {
        self.is_creator
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    // Derivations

    /// Whether `user` owns this team; either signal from the directory counts
    pub fn is_creator(&self, user: &Npub) -> bool {
        self.is_creator || self.created_by == *user
    }

    pub fn accepted_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.status.is_accepted())
    }

    pub fn pending_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.status.is_pending())
    }

    /// Displayed member count: accepted members plus the creator
    pub fn total_member_count(&self) -> usize {
        self.accepted_members().count() + 1
    }

    pub fn member(&self, npub: &Npub) -> Option<&Member> {
        self.members.iter().find(|m| m.npub == *npub)
    }

    /// Whether `user` has joined the team (creator or accepted member)
    pub fn has_joined(&self, user: &Npub) -> bool {
        self.created_by == *user
            || self
                .member(user)
                .is_some_and(|member| member.status.is_accepted())
    }

    // Mutators, reserved for directory implementations

    /// Copy of this team with the creator flag computed for `viewer`
    pub fn viewed_by(&self, viewer: &Npub) -> Self {
        Self {
            is_creator: self.created_by == *viewer,
            ..self.clone()
        }
    }

    /// Insert or replace the entry for `member.npub`
    pub fn upsert_member(&mut self, member: Member) {
        match self.members.iter_mut().find(|m| m.npub == member.npub) {
            Some(existing) => *existing = member,
            None => self.members.push(member),
        }
    }

    /// Remove the entry for `npub`, returning whether one existed
    pub fn remove_member(&mut self, npub: &Npub) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.npub != *npub);
        self.members.len() != before
    }
}
