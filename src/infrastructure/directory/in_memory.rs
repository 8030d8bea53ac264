//! In-memory team directory
//!
//! Stands in for the remote document store in tests and the CLI. Every
//! mutation fans out pushes to matching subscribers after the state lock has
//! been released.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use super::fixture::DirectoryFixture;
use crate::domain::{
    CancelToken, DirectoryEvent, DomainError, EventHandler, Invite, InviteId, InviteStatus,
    Member, Npub, ProgressEntry, SubscriptionKey, Team, TeamDirectory, TeamId,
};

/// Operations of the directory, used for call counting and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryOperation {
    TeamsForUser,
    InvitesForUser,
    TeamMemberProgress,
    AcceptInvite,
    RejectInvite,
    DeleteTeam,
    LeaveTeam,
}

#[derive(Debug, Default)]
struct DirectoryState {
    teams: BTreeMap<TeamId, Team>,
    invites: Vec<Invite>,
    progress: BTreeMap<TeamId, Vec<ProgressEntry>>,
}

impl DirectoryState {
    fn invites_for(&self, user: &Npub) -> Vec<Invite> {
        self.invites
            .iter()
            .filter(|i| i.is_addressed_to(user))
            .cloned()
            .collect()
    }
}

#[derive(Default)]
struct Faults {
    next: HashMap<DirectoryOperation, Vec<String>>,
    progress: HashMap<TeamId, String>,
}

struct Subscriber {
    key: SubscriptionKey,
    handler: EventHandler,
}

type Subscribers = Arc<RwLock<HashMap<Uuid, Subscriber>>>;

/// Change to publish once the state lock is gone
enum Change {
    Invites(Npub),
    Team(TeamId),
}

/// Thread-safe in-memory implementation of [`TeamDirectory`]
pub struct InMemoryTeamDirectory {
    state: RwLock<DirectoryState>,
    subscribers: Subscribers,
    latency: Mutex<Duration>,
    faults: Mutex<Faults>,
    calls: Mutex<HashMap<DirectoryOperation, usize>>,
}

impl Default for InMemoryTeamDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryTeamDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTeamDirectory")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl InMemoryTeamDirectory {
    /// Creates an empty directory
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DirectoryState::default()),
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            latency: Mutex::new(Duration::ZERO),
            faults: Mutex::new(Faults::default()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a directory pre-populated from a fixture
    pub fn with_fixture(fixture: DirectoryFixture) -> Self {
        let directory = Self::new();
        {
            let mut state = directory
                .state
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            state.teams = fixture
                .teams
                .into_iter()
                .map(|team| (team.id().clone(), team.with_creator_flag(false)))
                .collect();
            state.invites = fixture.invites;
            state.progress = fixture.progress;
        }
        directory
    }

    /// Snapshot of the current contents
    pub fn fixture(&self) -> Result<DirectoryFixture, DomainError> {
        let state = self.read_state()?;

        Ok(DirectoryFixture {
            teams: state.teams.values().cloned().collect(),
            invites: state.invites.clone(),
            progress: state.progress.clone(),
        })
    }

    /// Delay applied to every request
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    /// Make the next call of `operation` fail with `message`
    pub fn fail_next(&self, operation: DirectoryOperation, message: impl Into<String>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults
                .next
                .entry(operation)
                .or_default()
                .push(message.into());
        }
    }

    /// Make every progress query for `team` fail with `message`
    pub fn fail_progress_for(&self, team: TeamId, message: impl Into<String>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.progress.insert(team, message.into());
        }
    }

    /// Number of calls made to `operation` so far
    pub fn call_count(&self, operation: DirectoryOperation) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&operation).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Store a team, replacing any team with the same ID
    pub fn insert_team(&self, team: Team) -> Result<(), DomainError> {
        let team_id = team.id().clone();
        {
            let mut state = self.write_state()?;
            state.teams.insert(team_id.clone(), team.with_creator_flag(false));
        }
        self.publish(vec![Change::Team(team_id)]);
        Ok(())
    }

    /// Replace the stored progress entries of a team
    pub fn set_progress(
        &self,
        team: TeamId,
        entries: Vec<ProgressEntry>,
    ) -> Result<(), DomainError> {
        let mut state = self.write_state()?;
        state.progress.insert(team, entries);
        Ok(())
    }

    /// Invite a user: stores the invite and a pending member entry
    pub fn create_invite(&self, invite: Invite, invitee_name: &str) -> Result<(), DomainError> {
        let team_id = invite.team_id.clone();
        let invitee = invite.invitee_npub.clone();
        {
            let mut state = self.write_state()?;

            if state.invites.iter().any(|i| i.id == invite.id) {
                return Err(DomainError::conflict(format!(
                    "Invite '{}' already exists",
                    invite.id
                )));
            }

            let team = state.teams.get_mut(&team_id).ok_or_else(|| {
                DomainError::not_found(format!("Team '{}' not found", team_id))
            })?;

            if team.member(&invitee).is_none() {
                team.upsert_member(Member::pending(invitee.clone(), invitee_name));
            }

            state.invites.push(invite);
        }

        info!(team_id = %team_id, invitee = %invitee, "Invite created");
        self.publish(vec![Change::Invites(invitee), Change::Team(team_id)]);
        Ok(())
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, DirectoryState>, DomainError> {
        self.state
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, DirectoryState>, DomainError> {
        self.state
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Count the call, wait for the configured latency, apply injected faults
    async fn begin(&self, operation: DirectoryOperation) -> Result<(), DomainError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(operation).or_insert(0) += 1;
        }

        let latency = self.latency.lock().map(|l| *l).unwrap_or(Duration::ZERO);

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let fault = self.faults.lock().ok().and_then(|mut faults| {
            let queue = faults.next.get_mut(&operation)?;

            if queue.is_empty() {
                None
            } else {
                Some(queue.remove(0))
            }
        });

        match fault {
            Some(message) => Err(DomainError::remote(message)),
            None => Ok(()),
        }
    }

    /// Deliver pushes for `changes` to every matching subscriber
    fn publish(&self, changes: Vec<Change>) {
        let deliveries: Vec<(EventHandler, DirectoryEvent)> = {
            let (Ok(state), Ok(subscribers)) = (self.state.read(), self.subscribers.read()) else {
                return;
            };

            let mut deliveries = Vec::new();

            for change in &changes {
                for subscriber in subscribers.values() {
                    let event = match (change, &subscriber.key) {
                        (Change::Invites(user), SubscriptionKey::Invites { user: subscribed })
                            if user == subscribed =>
                        {
                            DirectoryEvent::Invites(state.invites_for(user))
                        }
                        (Change::Team(team_id), SubscriptionKey::Team { user, team })
                            if team_id == team =>
                        {
                            let visible = state
                                .teams
                                .get(team_id)
                                .filter(|t| t.has_joined(user))
                                .map(|t| t.viewed_by(user));

                            DirectoryEvent::Team {
                                team_id: team_id.clone(),
                                team: visible,
                            }
                        }
                        _ => continue,
                    };

                    deliveries.push((subscriber.handler.clone(), event));
                }
            }

            deliveries
        };

        debug!(count = deliveries.len(), "Publishing directory events");

        for (handler, event) in deliveries {
            handler(event);
        }
    }
}

#[async_trait]
impl TeamDirectory for InMemoryTeamDirectory {
    async fn teams_for_user(&self, user: &Npub) -> Result<Vec<Team>, DomainError> {
        self.begin(DirectoryOperation::TeamsForUser).await?;
        let state = self.read_state()?;

        Ok(state
            .teams
            .values()
            .filter(|team| team.has_joined(user))
            .map(|team| team.viewed_by(user))
            .collect())
    }

    async fn invites_for_user(&self, user: &Npub) -> Result<Vec<Invite>, DomainError> {
        self.begin(DirectoryOperation::InvitesForUser).await?;
        Ok(self.read_state()?.invites_for(user))
    }

    async fn team_member_progress(
        &self,
        creator: &Npub,
        team: &TeamId,
    ) -> Result<Vec<ProgressEntry>, DomainError> {
        self.begin(DirectoryOperation::TeamMemberProgress).await?;

        let injected = self
            .faults
            .lock()
            .ok()
            .and_then(|faults| faults.progress.get(team).cloned());

        if let Some(message) = injected {
            return Err(DomainError::remote(message));
        }

        let state = self.read_state()?;
        let stored = state
            .teams
            .get(team)
            .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team)))?;

        // Progress lives under the creator; any other anchor finds nothing.
        if stored.created_by() != creator {
            return Ok(Vec::new());
        }

        Ok(state.progress.get(team).cloned().unwrap_or_default())
    }

    async fn accept_invite(&self, user: &Npub, invite: &InviteId) -> Result<(), DomainError> {
        self.begin(DirectoryOperation::AcceptInvite).await?;

        let team_id = {
            let mut state = self.write_state()?;
            let index = state
                .invites
                .iter()
                .position(|i| i.id == *invite)
                .ok_or_else(|| DomainError::not_found(format!("Invite '{}' not found", invite)))?;

            let pending = &state.invites[index];

            if !pending.is_addressed_to(user) {
                return Err(DomainError::forbidden("This invite is addressed to someone else"));
            }

            if !pending.status.is_pending() {
                return Err(DomainError::conflict("This invite has already been answered"));
            }

            let team_id = pending.team_id.clone();
            let team = state.teams.get_mut(&team_id).ok_or_else(|| {
                DomainError::not_found(format!("Team '{}' no longer exists", team_id))
            })?;

            let name = team
                .member(user)
                .map(|m| m.name.clone())
                .unwrap_or_else(|| user.to_string());

            team.upsert_member(Member::accepted(user.clone(), name.clone()));
            state.invites[index].status = InviteStatus::Accepted;

            let entries = state.progress.entry(team_id.clone()).or_default();

            if !entries.iter().any(|e| e.npub == *user) {
                entries.push(ProgressEntry::new(user.clone(), name).with_step(0));
            }

            team_id
        };

        info!(user = %user, invite_id = %invite, team_id = %team_id, "Invite accepted");
        self.publish(vec![Change::Invites(user.clone()), Change::Team(team_id)]);
        Ok(())
    }

    async fn reject_invite(&self, user: &Npub, invite: &InviteId) -> Result<(), DomainError> {
        self.begin(DirectoryOperation::RejectInvite).await?;

        let team_id = {
            let mut state = self.write_state()?;
            let index = state
                .invites
                .iter()
                .position(|i| i.id == *invite)
                .ok_or_else(|| DomainError::not_found(format!("Invite '{}' not found", invite)))?;

            let pending = &state.invites[index];

            if !pending.is_addressed_to(user) {
                return Err(DomainError::forbidden("This invite is addressed to someone else"));
            }

            if !pending.status.is_pending() {
                return Err(DomainError::conflict("This invite has already been answered"));
            }

            let team_id = pending.team_id.clone();
            state.invites[index].status = InviteStatus::Rejected;

            if let Some(team) = state.teams.get_mut(&team_id) {
                if team.member(user).is_some_and(|m| m.status.is_pending()) {
                    team.remove_member(user);
                }
            }

            team_id
        };

        info!(user = %user, invite_id = %invite, team_id = %team_id, "Invite rejected");
        self.publish(vec![Change::Invites(user.clone()), Change::Team(team_id)]);
        Ok(())
    }

    async fn delete_team(&self, user: &Npub, team: &TeamId) -> Result<(), DomainError> {
        self.begin(DirectoryOperation::DeleteTeam).await?;

        let invitees = {
            let mut state = self.write_state()?;
            let stored = state
                .teams
                .get(team)
                .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team)))?;

            if stored.created_by() != user {
                return Err(DomainError::forbidden("Only the team creator can delete the team"));
            }

            state.teams.remove(team);
            state.progress.remove(team);

            let mut invitees: Vec<Npub> = state
                .invites
                .iter()
                .filter(|i| i.team_id == *team)
                .map(|i| i.invitee_npub.clone())
                .collect();
            invitees.sort();
            invitees.dedup();

            state.invites.retain(|i| i.team_id != *team);
            invitees
        };

        info!(user = %user, team_id = %team, "Team deleted");

        let mut changes: Vec<Change> = invitees.into_iter().map(Change::Invites).collect();
        changes.push(Change::Team(team.clone()));
        self.publish(changes);
        Ok(())
    }

    async fn leave_team(
        &self,
        user: &Npub,
        creator: &Npub,
        team: &TeamId,
    ) -> Result<(), DomainError> {
        self.begin(DirectoryOperation::LeaveTeam).await?;

        {
            let mut state = self.write_state()?;
            let stored = state
                .teams
                .get_mut(team)
                .ok_or_else(|| DomainError::not_found(format!("Team '{}' not found", team)))?;

            if stored.created_by() != creator {
                return Err(DomainError::validation(format!(
                    "Team '{}' is not owned by '{}'",
                    team, creator
                )));
            }

            if stored.created_by() == user {
                return Err(DomainError::forbidden(
                    "The team creator cannot leave; delete the team instead",
                ));
            }

            if !stored.remove_member(user) {
                return Err(DomainError::not_found("You are not a member of this team"));
            }

            if let Some(entries) = state.progress.get_mut(team) {
                entries.retain(|e| e.npub != *user);
            }
        }

        info!(user = %user, team_id = %team, "Left team");
        self.publish(vec![Change::Team(team.clone())]);
        Ok(())
    }

    fn subscribe(&self, key: SubscriptionKey, handler: EventHandler) -> CancelToken {
        let id = Uuid::new_v4();

        match self.subscribers.write() {
            Ok(mut subscribers) => {
                debug!(subscription_id = %id, key = ?key, "Subscribed");
                subscribers.insert(id, Subscriber { key, handler });
            }
            Err(_) => return CancelToken::noop(),
        }

        let registry = Arc::downgrade(&self.subscribers);

        CancelToken::new(move || {
            if let Some(registry) = registry.upgrade() {
                if let Ok(mut subscribers) = registry.write() {
                    subscribers.remove(&id);
                    debug!(subscription_id = %id, "Unsubscribed");
                }
            }
        })
    }
}
