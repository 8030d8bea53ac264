//! Team directory - the remote store that owns teams, members and invites

mod subscription;

pub use subscription::{CancelToken, DirectoryEvent, EventHandler, SubscriptionKey};

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::identity::Npub;
use crate::domain::invite::{Invite, InviteId};
use crate::domain::progress::ProgressEntry;
use crate::domain::team::{Team, TeamId};

#[cfg(test)]
use mockall::automock;

/// Remote team directory with request/response and push interfaces
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TeamDirectory: Send + Sync {
    /// Teams `user` created or has joined
    async fn teams_for_user(&self, user: &Npub) -> Result<Vec<Team>, DomainError>;

    /// Every invite addressed to `user`, whatever its status
    async fn invites_for_user(&self, user: &Npub) -> Result<Vec<Invite>, DomainError>;

    /// Progress of the members of `team`, queried relative to `creator`
    async fn team_member_progress(
        &self,
        creator: &Npub,
        team: &TeamId,
    ) -> Result<Vec<ProgressEntry>, DomainError>;

    async fn accept_invite(&self, user: &Npub, invite: &InviteId) -> Result<(), DomainError>;

    async fn reject_invite(&self, user: &Npub, invite: &InviteId) -> Result<(), DomainError>;

    /// Delete `team`; only its creator may do so
    async fn delete_team(&self, user: &Npub, team: &TeamId) -> Result<(), DomainError>;

    async fn leave_team(
        &self,
        user: &Npub,
        creator: &Npub,
        team: &TeamId,
    ) -> Result<(), DomainError>;

    /// Register `handler` for pushes matching `key`
    fn subscribe(&self, key: SubscriptionKey, handler: EventHandler) -> CancelToken;
}
