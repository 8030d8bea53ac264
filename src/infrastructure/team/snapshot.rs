//! Display view derived from coordinator state

use serde::Serialize;

use super::state::CoordinatorState;
use crate::domain::{Curriculum, Invite, Member, Npub, ProgressColor, ProgressEntry, Team, TeamId};

/// One member's progress bar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProgress {
    pub npub: Npub,
    pub name: String,
    pub is_creator: bool,
    pub streak: u32,
    pub answered_steps_count: u32,
    pub percentage: f64,
    pub color: ProgressColor,
}

impl MemberProgress {
    pub fn derive(entry: &ProgressEntry, curriculum: &Curriculum) -> Self {
        let step = entry.step.as_ref();

        Self {
            npub: entry.npub.clone(),
            name: entry.name.clone(),
            is_creator: entry.is_creator,
            streak: entry.streak,
            answered_steps_count: entry.answered_steps_count,
            percentage: curriculum.percentage_for_step(step),
            color: curriculum.color_for_step(step),
        }
    }
}

/// A team as shown to the current user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamView {
    pub id: TeamId,
    pub team_name: String,
    pub created_by: Npub,
    pub is_creator: bool,
    pub total_member_count: usize,
    pub accepted_members: Vec<Member>,
    pub pending_members: Vec<Member>,
    pub progress: Vec<MemberProgress>,
}

impl TeamView {
    pub fn derive(
        team: &Team,
        user: &Npub,
        progress: Option<&Vec<ProgressEntry>>,
        curriculum: &Curriculum,
    ) -> Self {
        Self {
            id: team.id().clone(),
            team_name: team.team_name().to_string(),
            created_by: team.created_by().clone(),
            is_creator: team.is_creator(user),
            total_member_count: team.total_member_count(),
            accepted_members: team.accepted_members().cloned().collect(),
            pending_members: team.pending_members().cloned().collect(),
            progress: progress
                .map(|entries| {
                    entries
                        .iter()
                        .map(|entry| MemberProgress::derive(entry, curriculum))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Everything the team screen displays
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    pub user: Npub,
    pub loading: bool,
    pub teams: Vec<TeamView>,
    pub pending_invites: Vec<Invite>,
}

impl TeamSnapshot {
    pub fn derive(user: &Npub, state: &CoordinatorState, curriculum: &Curriculum) -> Self {
        Self {
            user: user.clone(),
            loading: state.loading,
            teams: state
                .teams
                .iter()
                .map(|team| TeamView::derive(team, user, state.progress.get(team.id()), curriculum))
                .collect(),
            pending_invites: state.pending_invites().into_iter().cloned().collect(),
        }
    }

    pub fn team(&self, id: &TeamId) -> Option<&TeamView> {
        self.teams.iter().find(|t| t.id == *id)
    }
}
