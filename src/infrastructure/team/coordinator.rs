//! Team membership coordinator
//!
//! Keeps the current user's teams, invites and member progress in sync with
//! the team directory and mediates invite and membership actions. Every
//! failure ends up as a notification; no method returns an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::snapshot::TeamSnapshot;
use super::state::{ActionKey, ActionOutcome, CoordinatorState, InFlightActions};
use crate::domain::{
    CancelToken, Confirmer, Curriculum, DirectoryEvent, DomainError, EventHandler, InviteId,
    Notification, Notifier, Npub, SubscriptionKey, Team, TeamDirectory, TeamId,
};
use crate::infrastructure::notification::{AutoConfirmer, TracingNotifier};

const LOAD_FAILED: &str = "Failed to load team data";
const ACCEPT_FAILED: &str = "Failed to accept invite";
const REJECT_FAILED: &str = "Failed to reject invite";
const DELETE_FAILED: &str = "Failed to delete team";
const LEAVE_FAILED: &str = "Failed to leave team";

#[derive(Default)]
struct Subscriptions {
    invites: Option<CancelToken>,
    teams: Vec<CancelToken>,
    /// Team count the per-team subscriptions were built for
    team_count: Option<usize>,
}

/// Coordinates one user's view of their teams and invites
pub struct TeamCoordinator<D: TeamDirectory> {
    directory: Arc<D>,
    user: Npub,
    notifier: Arc<dyn Notifier>,
    confirmer: Arc<dyn Confirmer>,
    curriculum: Curriculum,
    state: RwLock<CoordinatorState>,
    in_flight: InFlightActions,
    subscriptions: Mutex<Subscriptions>,
    events_tx: mpsc::UnboundedSender<DirectoryEvent>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<DirectoryEvent>>,
}

impl<D: TeamDirectory> std::fmt::Debug for TeamCoordinator<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamCoordinator")
            .field("user", &self.user)
            .field("state", &self.read_state(|s| s.clone()))
            .finish()
    }
}

impl<D: TeamDirectory> TeamCoordinator<D> {
    /// Create a coordinator for `user`; nothing is fetched until [`start`](Self::start)
    ///
    /// Notifications go to the log and destructive actions are declined
    /// until a notifier and confirmer are configured.
    pub fn new(directory: Arc<D>, user: Npub) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            directory,
            user,
            notifier: Arc::new(TracingNotifier),
            confirmer: Arc::new(AutoConfirmer::decline()),
            curriculum: Curriculum::default(),
            state: RwLock::new(CoordinatorState::default()),
            in_flight: InFlightActions::new(),
            subscriptions: Mutex::new(Subscriptions::default()),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_curriculum(mut self, curriculum: Curriculum) -> Self {
        self.curriculum = curriculum;
        self
    }

    pub fn user(&self) -> &Npub {
        &self.user
    }

    /// Copy of the cached state
    pub fn state(&self) -> CoordinatorState {
        self.read_state(|s| s.clone())
    }

    pub fn snapshot(&self) -> TeamSnapshot {
        self.read_state(|s| TeamSnapshot::derive(&self.user, s, &self.curriculum))
    }

    pub fn is_in_flight(&self, key: &ActionKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Subscribe to invite pushes, then load everything
    pub async fn start(&self) -> ActionOutcome {
        self.subscribe_invites();
        self.load().await
    }

    /// External refresh signal; reloads everything
    pub async fn refresh(&self) -> ActionOutcome {
        self.load().await
    }

    /// Fetch teams, invites and member progress from the directory
    #[instrument(skip(self), fields(user = %self.user))]
    pub async fn load(&self) -> ActionOutcome {
        self.write_state(|s| s.loading = true);

        let fetched = tokio::try_join!(
            self.directory.teams_for_user(&self.user),
            self.directory.invites_for_user(&self.user),
        );

        let (teams, invites) = match fetched {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(error = %e, "Failed to load team data");
                self.notifier.notify(Notification::error("Error", LOAD_FAILED));
                self.write_state(|s| s.loading = false);
                return ActionOutcome::Failed;
            }
        };

        let mut progress = HashMap::new();

        for team in &teams {
            // Progress is stored under the team's creator.
            let anchor = if team.is_creator(&self.user) {
                &self.user
            } else {
                team.created_by()
            };

            match self.directory.team_member_progress(anchor, team.id()).await {
                Ok(entries) => {
                    progress.insert(team.id().clone(), entries);
                }
                Err(e) => {
                    warn!(team_id = %team.id(), error = %e, "Failed to load team progress");
                }
            }
        }

        info!(
            teams = teams.len(),
            invites = invites.len(),
            "Team data loaded"
        );

        self.write_state(|s| {
            s.teams = teams;
            s.invites = invites;
            s.progress = progress;
            s.loading = false;
        });
        self.sync_team_subscriptions();

        ActionOutcome::Completed
    }

    /// Accept an invite, then reload to pick up the joined team
    #[instrument(skip(self), fields(user = %self.user))]
    pub async fn accept_invite(&self, invite_id: &InviteId) -> ActionOutcome {
        if self.read_state(|s| s.invite(invite_id).is_none()) {
            warn!(invite_id = %invite_id, "Unknown invite");
            return ActionOutcome::Unavailable;
        }

        let Some(_guard) = self.in_flight.try_begin(ActionKey::Invite(invite_id.clone())) else {
            debug!(invite_id = %invite_id, "Invite action already in flight");
            return ActionOutcome::InFlight;
        };

        match self.directory.accept_invite(&self.user, invite_id).await {
            Ok(()) => {
                info!(invite_id = %invite_id, "Invite accepted");
                self.notifier.notify(Notification::success(
                    "Invite accepted",
                    "You have joined the team",
                ));
                self.load().await;
                ActionOutcome::Completed
            }
            Err(e) => self.report_failure(&e, ACCEPT_FAILED),
        }
    }

    /// Reject an invite; the invite push removes it from the pending list
    #[instrument(skip(self), fields(user = %self.user))]
    pub async fn reject_invite(&self, invite_id: &InviteId) -> ActionOutcome {
        if self.read_state(|s| s.invite(invite_id).is_none()) {
            warn!(invite_id = %invite_id, "Unknown invite");
            return ActionOutcome::Unavailable;
        }

        let Some(_guard) = self.in_flight.try_begin(ActionKey::Invite(invite_id.clone())) else {
            debug!(invite_id = %invite_id, "Invite action already in flight");
            return ActionOutcome::InFlight;
        };

        match self.directory.reject_invite(&self.user, invite_id).await {
            Ok(()) => {
                info!(invite_id = %invite_id, "Invite rejected");
                self.notifier.notify(Notification::success(
                    "Invite rejected",
                    "The invite has been declined",
                ));
                ActionOutcome::Completed
            }
            Err(e) => self.report_failure(&e, REJECT_FAILED),
        }
    }

    /// Delete a team the user created, after confirmation
    #[instrument(skip(self), fields(user = %self.user))]
    pub async fn delete_team(&self, team_id: &TeamId) -> ActionOutcome {
        let Some(team) = self.known_team(team_id) else {
            return ActionOutcome::Unavailable;
        };

        if !team.is_creator(&self.user) {
            warn!(team_id = %team_id, "Only the team creator can delete a team");
            return ActionOutcome::Unavailable;
        }

        let Some(_guard) = self.in_flight.try_begin(ActionKey::Team(team_id.clone())) else {
            debug!(team_id = %team_id, "Team action already in flight");
            return ActionOutcome::InFlight;
        };

        let prompt = format!(
            "Are you sure you want to delete the team \"{}\"? This cannot be undone.",
            team.team_name()
        );

        if !self.confirmer.confirm(&prompt).await {
            debug!(team_id = %team_id, "Team deletion declined");
            return ActionOutcome::Declined;
        }

        match self.directory.delete_team(&self.user, team_id).await {
            Ok(()) => {
                info!(team_id = %team_id, "Team deleted");
                self.notifier.notify(Notification::success(
                    "Team deleted",
                    format!("\"{}\" has been deleted", team.team_name()),
                ));
                self.write_state(|s| s.remove_team(team_id));
                self.sync_team_subscriptions();
                ActionOutcome::Completed
            }
            Err(e) => self.report_failure(&e, DELETE_FAILED),
        }
    }

    /// Leave a team the user joined, after confirmation
    #[instrument(skip(self), fields(user = %self.user))]
    pub async fn leave_team(&self, team_id: &TeamId) -> ActionOutcome {
        let Some(team) = self.known_team(team_id) else {
            return ActionOutcome::Unavailable;
        };

        if team.is_creator(&self.user) {
            warn!(team_id = %team_id, "The team creator cannot leave their own team");
            return ActionOutcome::Unavailable;
        }

        let Some(_guard) = self.in_flight.try_begin(ActionKey::Team(team_id.clone())) else {
            debug!(team_id = %team_id, "Team action already in flight");
            return ActionOutcome::InFlight;
        };

        let prompt = format!(
            "Are you sure you want to leave the team \"{}\"?",
            team.team_name()
        );

        if !self.confirmer.confirm(&prompt).await {
            debug!(team_id = %team_id, "Leaving team declined");
            return ActionOutcome::Declined;
        }

        match self
            .directory
            .leave_team(&self.user, team.created_by(), team_id)
            .await
        {
            Ok(()) => {
                info!(team_id = %team_id, "Left team");
                self.notifier.notify(Notification::success(
                    "Left team",
                    format!("You are no longer a member of \"{}\"", team.team_name()),
                ));
                self.load().await;
                ActionOutcome::Completed
            }
            Err(e) => self.report_failure(&e, LEAVE_FAILED),
        }
    }

    /// Apply one pushed change
    pub async fn handle_event(&self, event: DirectoryEvent) {
        match event {
            DirectoryEvent::Invites(invites) => {
                debug!(count = invites.len(), "Invite list pushed");
                self.write_state(|s| s.invites = invites);
            }
            DirectoryEvent::Team {
                team_id,
                team: Some(team),
            } => {
                debug!(team_id = %team_id, "Team update pushed");

                if !self.write_state(|s| s.replace_team(team)) {
                    debug!(team_id = %team_id, "Ignoring push for a team no longer known");
                    return;
                }

                // Unlike `load`, pushed refreshes query with the viewer's identity.
                let refreshed = self
                    .directory
                    .team_member_progress(&self.user, &team_id)
                    .await;

                match refreshed {
                    Ok(entries) => {
                        // The team may have been removed while the fetch was running.
                        self.write_state(|s| {
                            if s.team(&team_id).is_some() {
                                s.progress.insert(team_id, entries);
                            }
                        });
                    }
                    Err(e) => {
                        warn!(team_id = %team_id, error = %e, "Failed to refresh team progress");
                    }
                }
            }
            DirectoryEvent::Team { team_id, team: None } => {
                debug!(team_id = %team_id, "Ignoring empty team push");
            }
        }
    }

    /// Apply every push received so far without waiting; returns how many
    pub async fn process_pending_events(&self) -> usize {
        let mut events_rx = self.events_rx.lock().await;
        let mut handled = 0;

        while let Ok(event) = events_rx.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }

        handled
    }

    /// Wait for the next push and apply it
    pub async fn next_event(&self) -> bool {
        let mut events_rx = self.events_rx.lock().await;

        match events_rx.recv().await {
            Some(event) => {
                self.handle_event(event).await;
                true
            }
            None => false,
        }
    }

    /// Cancel every subscription
    pub fn shutdown(&self) {
        let mut subscriptions = self.lock_subscriptions();

        if let Some(mut token) = subscriptions.invites.take() {
            token.cancel();
        }

        for mut token in subscriptions.teams.drain(..) {
            token.cancel();
        }

        subscriptions.team_count = None;
        info!(user = %self.user, "Team subscriptions cancelled");
    }

    fn subscribe_invites(&self) {
        let mut subscriptions = self.lock_subscriptions();

        if subscriptions.invites.is_some() {
            return;
        }

        subscriptions.invites = Some(self.directory.subscribe(
            SubscriptionKey::invites(self.user.clone()),
            self.event_handler(),
        ));
    }

    /// Rebuild per-team subscriptions when the number of known teams changed
    fn sync_team_subscriptions(&self) {
        let team_ids: Vec<TeamId> =
            self.read_state(|s| s.teams.iter().map(|t| t.id().clone()).collect());
        let mut subscriptions = self.lock_subscriptions();

        if subscriptions.team_count == Some(team_ids.len()) {
            return;
        }

        for mut token in subscriptions.teams.drain(..) {
            token.cancel();
        }

        debug!(count = team_ids.len(), "Subscribing to team updates");
        subscriptions.team_count = Some(team_ids.len());
        subscriptions.teams = team_ids
            .into_iter()
            .map(|team_id| {
                self.directory.subscribe(
                    SubscriptionKey::team(self.user.clone(), team_id),
                    self.event_handler(),
                )
            })
            .collect();
    }

    fn event_handler(&self) -> EventHandler {
        let events_tx = self.events_tx.clone();

        Arc::new(move |event: DirectoryEvent| {
            if events_tx.send(event).is_err() {
                debug!("Coordinator gone, dropping directory event");
            }
        })
    }

    fn report_failure(&self, error: &DomainError, fallback: &str) -> ActionOutcome {
        error!(error = %error, "{}", fallback);
        self.notifier
            .notify(Notification::error("Error", error.user_message(fallback)));
        ActionOutcome::Failed
    }

    fn known_team(&self, team_id: &TeamId) -> Option<Team> {
        let team = self.read_state(|s| s.team(team_id).cloned());

        if team.is_none() {
            warn!(team_id = %team_id, "Unknown team");
        }

        team
    }

    fn read_state<T>(&self, f: impl FnOnce(&CoordinatorState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(|p| p.into_inner());
        f(&state)
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut CoordinatorState) -> T) -> T {
        let mut state = self.state.write().unwrap_or_else(|p| p.into_inner());
        f(&mut state)
    }

    fn lock_subscriptions(&self) -> std::sync::MutexGuard<'_, Subscriptions> {
        self.subscriptions.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Invite, InviteStatus, Member, MockTeamDirectory, NotificationLevel, ProgressColor,
        ProgressEntry,
    };
    use crate::infrastructure::directory::{DirectoryOperation, InMemoryTeamDirectory};
    use crate::infrastructure::notification::RecordingNotifier;
    use std::time::Duration;

    fn npub(value: &str) -> Npub {
        Npub::new(value).unwrap()
    }

    fn team_id(value: &str) -> TeamId {
        TeamId::new(value).unwrap()
    }

    fn me() -> Npub {
        npub("npub1me")
    }

    /// - team-a: created by me, Bob accepted, Carol pending
    /// - team-b: created by Zed, I am an accepted member
    /// - team-c: created by Yan, invite inv-1 pending for me
    /// - inv-0: an old invite I already rejected
    fn directory() -> Arc<InMemoryTeamDirectory> {
        let directory = InMemoryTeamDirectory::new();

        directory
            .insert_team(
                Team::new(team_id("team-a"), "Rustaceans", me())
                    .unwrap()
                    .with_members(vec![
                        Member::accepted(npub("npub1bob"), "Bob"),
                        Member::pending(npub("npub1carol"), "Carol"),
                    ]),
            )
            .unwrap();
        directory
            .insert_team(
                Team::new(team_id("team-b"), "Gophers", npub("npub1zed"))
                    .unwrap()
                    .with_members(vec![Member::accepted(me(), "Me")]),
            )
            .unwrap();
        directory
            .insert_team(Team::new(team_id("team-c"), "Crabs", npub("npub1yan")).unwrap())
            .unwrap();

        directory
            .set_progress(
                team_id("team-a"),
                vec![
                    ProgressEntry::new(me(), "Me").as_creator().with_step(50),
                    ProgressEntry::new(npub("npub1bob"), "Bob").with_step(3),
                ],
            )
            .unwrap();
        directory
            .set_progress(
                team_id("team-b"),
                vec![
                    ProgressEntry::new(npub("npub1zed"), "Zed").as_creator().with_step(120),
                    ProgressEntry::new(me(), "Me").with_step(10),
                ],
            )
            .unwrap();

        directory
            .create_invite(
                Invite::new(InviteId::new("inv-1"), team_id("team-c"), "Crabs", me(), "Yan"),
                "Me",
            )
            .unwrap();
        directory
            .create_invite(
                Invite {
                    status: InviteStatus::Rejected,
                    ..Invite::new(InviteId::new("inv-0"), team_id("team-b"), "Gophers", me(), "Zed")
                },
                "Me",
            )
            .unwrap();

        Arc::new(directory)
    }

    struct Harness {
        directory: Arc<InMemoryTeamDirectory>,
        notifier: Arc<RecordingNotifier>,
        confirmer: Arc<AutoConfirmer>,
        coordinator: TeamCoordinator<InMemoryTeamDirectory>,
    }

    fn harness_with(directory: Arc<InMemoryTeamDirectory>, confirm: bool) -> Harness {
        let notifier = Arc::new(RecordingNotifier::new());
        let confirmer = Arc::new(AutoConfirmer::new(confirm));
        let coordinator = TeamCoordinator::new(directory.clone(), me())
            .with_notifier(notifier.clone())
            .with_confirmer(confirmer.clone());

        Harness {
            directory,
            notifier,
            confirmer,
            coordinator,
        }
    }

    async fn started(confirm: bool) -> Harness {
        let harness = harness_with(directory(), confirm);
        assert_eq!(harness.coordinator.start().await, ActionOutcome::Completed);
        harness
    }

    #[tokio::test]
    async fn test_load_populates_state() {
        let h = started(true).await;
        let snapshot = h.coordinator.snapshot();

        assert!(!snapshot.loading);
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.pending_invites.len(), 1);
        assert_eq!(snapshot.pending_invites[0].id.as_str(), "inv-1");
        assert!(h.notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_creator_member_count() {
        let h = started(true).await;
        let snapshot = h.coordinator.snapshot();

        let owned = snapshot.team(&team_id("team-a")).unwrap();
        assert!(owned.is_creator);
        assert_eq!(owned.accepted_members.len(), 1);
        assert_eq!(owned.total_member_count, owned.accepted_members.len() + 1);

        let joined = snapshot.team(&team_id("team-b")).unwrap();
        assert!(!joined.is_creator);
    }

    #[tokio::test]
    async fn test_load_anchors_progress_at_creator() {
        let h = started(true).await;
        let state = h.coordinator.state();

        assert_eq!(state.progress[&team_id("team-a")].len(), 2);
        // team-b is owned by Zed; querying as a member would find nothing
        assert_eq!(state.progress[&team_id("team-b")].len(), 2);
        assert_eq!(
            h.directory.call_count(DirectoryOperation::TeamMemberProgress),
            2
        );
    }

    #[tokio::test]
    async fn test_single_progress_failure_is_isolated() {
        let directory = directory();
        directory.fail_progress_for(team_id("team-b"), "timeout");
        let h = harness_with(directory, true);

        assert_eq!(h.coordinator.start().await, ActionOutcome::Completed);

        let state = h.coordinator.state();
        assert_eq!(state.teams.len(), 2);
        assert_eq!(state.progress[&team_id("team-a")].len(), 2);
        assert!(!state.progress.contains_key(&team_id("team-b")));
        assert_eq!(
            h.directory.call_count(DirectoryOperation::TeamMemberProgress),
            2
        );
        assert!(h.notifier.errors().is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_state() {
        let h = started(true).await;
        h.directory
            .fail_next(DirectoryOperation::InvitesForUser, "offline");

        assert_eq!(h.coordinator.refresh().await, ActionOutcome::Failed);

        let state = h.coordinator.state();
        assert!(!state.loading);
        assert_eq!(state.teams.len(), 2);

        let errors = h.notifier.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].description, LOAD_FAILED);
    }

    #[tokio::test]
    async fn test_accept_invite_reloads_and_joins_team() {
        let h = started(true).await;

        let outcome = h.coordinator.accept_invite(&InviteId::new("inv-1")).await;
        assert_eq!(outcome, ActionOutcome::Completed);

        let snapshot = h.coordinator.snapshot();
        assert!(snapshot.team(&team_id("team-c")).is_some());
        assert!(snapshot.pending_invites.is_empty());
        assert_eq!(h.directory.call_count(DirectoryOperation::TeamsForUser), 2);

        let notifications = h.notifier.notifications();
        assert_eq!(notifications[0].level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn test_accept_invite_resubscribes_teams() {
        let h = started(true).await;
        // one invite subscription plus one per team
        assert_eq!(h.directory.subscriber_count(), 3);

        h.coordinator.accept_invite(&InviteId::new("inv-1")).await;
        assert_eq!(h.directory.subscriber_count(), 4);
    }

    #[tokio::test]
    async fn test_double_accept_sends_one_request() {
        let h = started(true).await;
        h.directory.set_latency(Duration::from_millis(20));
        let invite = InviteId::new("inv-1");

        let (first, second) = tokio::join!(
            h.coordinator.accept_invite(&invite),
            h.coordinator.accept_invite(&invite),
        );

        assert_eq!(first, ActionOutcome::Completed);
        assert_eq!(second, ActionOutcome::InFlight);
        assert_eq!(h.directory.call_count(DirectoryOperation::AcceptInvite), 1);
        assert!(!h.coordinator.is_in_flight(&ActionKey::Invite(invite)));
    }

    #[tokio::test]
    async fn test_accept_failure_uses_remote_message() {
        let h = started(true).await;
        h.directory
            .fail_next(DirectoryOperation::AcceptInvite, "Invite expired");

        let outcome = h.coordinator.accept_invite(&InviteId::new("inv-1")).await;
        assert_eq!(outcome, ActionOutcome::Failed);
        assert_eq!(h.notifier.errors()[0].description, "Invite expired");
        assert_eq!(h.coordinator.snapshot().pending_invites.len(), 1);
        assert!(!h
            .coordinator
            .is_in_flight(&ActionKey::Invite(InviteId::new("inv-1"))));
    }

    #[tokio::test]
    async fn test_accept_failure_without_message_uses_fallback() {
        let h = started(true).await;
        h.directory.fail_next(DirectoryOperation::AcceptInvite, "");

        h.coordinator.accept_invite(&InviteId::new("inv-1")).await;
        assert_eq!(h.notifier.errors()[0].description, ACCEPT_FAILED);
    }

    #[tokio::test]
    async fn test_accept_unknown_invite() {
        let h = started(true).await;

        let outcome = h.coordinator.accept_invite(&InviteId::new("nope")).await;
        assert_eq!(outcome, ActionOutcome::Unavailable);
        assert_eq!(h.directory.call_count(DirectoryOperation::AcceptInvite), 0);
    }

    #[tokio::test]
    async fn test_reject_waits_for_invite_push() {
        let h = started(true).await;
        let invite = InviteId::new("inv-1");

        let outcome = h.coordinator.reject_invite(&invite).await;
        assert_eq!(outcome, ActionOutcome::Completed);

        // no local splice, no refetch
        assert_eq!(h.coordinator.snapshot().pending_invites.len(), 1);
        assert_eq!(h.directory.call_count(DirectoryOperation::InvitesForUser), 1);

        assert!(h.coordinator.process_pending_events().await >= 1);
        assert!(h.coordinator.snapshot().pending_invites.is_empty());
    }

    #[tokio::test]
    async fn test_reject_failure() {
        let h = started(true).await;
        h.directory
            .fail_next(DirectoryOperation::RejectInvite, "Service unavailable");

        let outcome = h.coordinator.reject_invite(&InviteId::new("inv-1")).await;
        assert_eq!(outcome, ActionOutcome::Failed);
        assert_eq!(h.notifier.errors()[0].description, "Service unavailable");
    }

    #[tokio::test]
    async fn test_delete_team_removes_locally_without_reload() {
        let h = started(true).await;
        let team = team_id("team-a");

        let outcome = h.coordinator.delete_team(&team).await;
        assert_eq!(outcome, ActionOutcome::Completed);

        let state = h.coordinator.state();
        assert!(state.team(&team).is_none());
        assert!(!state.progress.contains_key(&team));
        assert_eq!(h.directory.call_count(DirectoryOperation::TeamsForUser), 1);
        assert!(h.confirmer.prompts()[0].contains("Rustaceans"));
        // invite subscription plus the remaining team
        assert_eq!(h.directory.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_declined_sends_nothing() {
        let h = started(false).await;

        let outcome = h.coordinator.delete_team(&team_id("team-a")).await;
        assert_eq!(outcome, ActionOutcome::Declined);
        assert_eq!(h.directory.call_count(DirectoryOperation::DeleteTeam), 0);
        assert!(h.notifier.notifications().is_empty());
        assert_eq!(h.coordinator.state().teams.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_requires_creator() {
        let h = started(true).await;

        let outcome = h.coordinator.delete_team(&team_id("team-b")).await;
        assert_eq!(outcome, ActionOutcome::Unavailable);
        assert!(h.confirmer.prompts().is_empty());
        assert_eq!(h.directory.call_count(DirectoryOperation::DeleteTeam), 0);
    }

    #[tokio::test]
    async fn test_double_delete_sends_one_request() {
        let h = started(true).await;
        h.directory.set_latency(Duration::from_millis(20));
        let team = team_id("team-a");

        let (first, second) = tokio::join!(
            h.coordinator.delete_team(&team),
            h.coordinator.delete_team(&team),
        );

        assert_eq!(first, ActionOutcome::Completed);
        assert_eq!(second, ActionOutcome::InFlight);
        assert_eq!(h.directory.call_count(DirectoryOperation::DeleteTeam), 1);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_team() {
        let h = started(true).await;
        h.directory
            .fail_next(DirectoryOperation::DeleteTeam, "Permission denied");

        let outcome = h.coordinator.delete_team(&team_id("team-a")).await;
        assert_eq!(outcome, ActionOutcome::Failed);
        assert_eq!(h.coordinator.state().teams.len(), 2);
        assert_eq!(h.notifier.errors()[0].description, "Permission denied");
    }

    #[tokio::test]
    async fn test_leave_team_reloads() {
        let h = started(true).await;
        let team = team_id("team-b");

        let outcome = h.coordinator.leave_team(&team).await;
        assert_eq!(outcome, ActionOutcome::Completed);

        let state = h.coordinator.state();
        assert!(state.team(&team).is_none());
        assert_eq!(state.teams.len(), 1);
        assert_eq!(h.directory.call_count(DirectoryOperation::TeamsForUser), 2);
        assert!(h.confirmer.prompts()[0].contains("Gophers"));
    }

    #[tokio::test]
    async fn test_creator_cannot_leave() {
        let h = started(true).await;

        let outcome = h.coordinator.leave_team(&team_id("team-a")).await;
        assert_eq!(outcome, ActionOutcome::Unavailable);
        assert_eq!(h.directory.call_count(DirectoryOperation::LeaveTeam), 0);
    }

    #[tokio::test]
    async fn test_leave_declined() {
        let h = started(false).await;

        let outcome = h.coordinator.leave_team(&team_id("team-b")).await;
        assert_eq!(outcome, ActionOutcome::Declined);
        assert_eq!(h.directory.call_count(DirectoryOperation::LeaveTeam), 0);
    }

    #[tokio::test]
    async fn test_team_push_replaces_team_and_refreshes_progress() {
        let h = started(true).await;

        // Carol accepts an invite to my team elsewhere.
        h.directory
            .create_invite(
                Invite::new(
                    InviteId::new("inv-carol"),
                    team_id("team-a"),
                    "Rustaceans",
                    npub("npub1carol"),
                    "Me",
                ),
                "Carol",
            )
            .unwrap();
        h.directory
            .accept_invite(&npub("npub1carol"), &InviteId::new("inv-carol"))
            .await
            .unwrap();

        h.coordinator.process_pending_events().await;

        let snapshot = h.coordinator.snapshot();
        let team = snapshot.team(&team_id("team-a")).unwrap();
        assert_eq!(team.accepted_members.len(), 2);
        assert_eq!(team.total_member_count, 3);
        assert_eq!(team.progress.len(), 3);
        assert_eq!(team.progress[0].color, ProgressColor::Cyan);
    }

    #[tokio::test]
    async fn test_team_push_refreshes_progress_as_viewer() {
        let h = started(true).await;
        let team = team_id("team-b");

        // Zed's team changes; the pushed refresh queries with my identity.
        h.directory
            .insert_team(
                Team::new(team.clone(), "Gophers 2", npub("npub1zed"))
                    .unwrap()
                    .with_members(vec![Member::accepted(me(), "Me")]),
            )
            .unwrap();
        h.coordinator.process_pending_events().await;

        let state = h.coordinator.state();
        assert_eq!(state.team(&team).unwrap().team_name(), "Gophers 2");
        assert!(state.progress[&team].is_empty());
    }

    #[tokio::test]
    async fn test_stale_team_push_after_delete_is_ignored() {
        let h = started(true).await;
        let team = team_id("team-a");
        let stale = h.coordinator.state().team(&team).cloned().unwrap();

        assert_eq!(h.coordinator.delete_team(&team).await, ActionOutcome::Completed);

        h.coordinator
            .handle_event(DirectoryEvent::Team {
                team_id: team.clone(),
                team: Some(stale),
            })
            .await;

        let state = h.coordinator.state();
        assert!(state.team(&team).is_none());
        assert!(!state.progress.contains_key(&team));
        assert_eq!(
            h.directory.call_count(DirectoryOperation::TeamMemberProgress),
            2
        );
    }

    #[tokio::test]
    async fn test_next_event_applies_push() {
        let h = started(true).await;

        h.directory
            .reject_invite(&me(), &InviteId::new("inv-1"))
            .await
            .unwrap();

        assert!(h.coordinator.next_event().await);
        assert!(h.coordinator.snapshot().pending_invites.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_subscriptions() {
        let h = started(true).await;
        assert_eq!(h.directory.subscriber_count(), 3);

        h.coordinator.shutdown();
        assert_eq!(h.directory.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_cancels_subscriptions() {
        let directory = directory();
        {
            let h = harness_with(directory.clone(), true);
            h.coordinator.start().await;
            assert_eq!(directory.subscriber_count(), 3);
        }
        assert_eq!(directory.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_start_subscribes_to_invites_once() {
        let h = started(true).await;

        h.coordinator.start().await;
        assert_eq!(h.directory.subscriber_count(), 3);
    }

    #[tokio::test]
    async fn test_load_failure_with_mock_directory() {
        let mut mock = MockTeamDirectory::new();
        mock.expect_teams_for_user()
            .times(1)
            .returning(|_| Err(DomainError::remote("unreachable")));
        mock.expect_invites_for_user()
            .returning(|_| Ok(Vec::new()));
        mock.expect_team_member_progress().never();
        mock.expect_subscribe()
            .returning(|_, _| CancelToken::noop());

        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = TeamCoordinator::new(Arc::new(mock), me()).with_notifier(notifier.clone());

        assert_eq!(coordinator.start().await, ActionOutcome::Failed);
        assert!(!coordinator.state().loading);
        assert_eq!(notifier.errors()[0].description, LOAD_FAILED);
    }

    #[tokio::test]
    async fn test_default_confirmer_declines() {
        let mut mock = MockTeamDirectory::new();
        mock.expect_teams_for_user().returning(|user| {
            Ok(vec![Team::new(TeamId::new("team-a").unwrap(), "Rustaceans", user.clone()).unwrap()])
        });
        mock.expect_invites_for_user().returning(|_| Ok(Vec::new()));
        mock.expect_team_member_progress()
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_subscribe()
            .returning(|_, _| CancelToken::noop());
        mock.expect_delete_team().never();

        let coordinator = TeamCoordinator::new(Arc::new(mock), me());
        coordinator.start().await;

        let outcome = coordinator.delete_team(&team_id("team-a")).await;
        assert_eq!(outcome, ActionOutcome::Declined);
    }
}
