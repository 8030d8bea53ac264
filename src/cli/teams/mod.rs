//! Team commands - run one coordinator action against the directory fixture

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::Command;
use crate::config::AppConfig;
use crate::domain::{Confirmer, Curriculum, InviteId, TeamId};
use crate::infrastructure::directory::{DirectoryFixture, InMemoryTeamDirectory};
use crate::infrastructure::identity::FileIdentityStore;
use crate::infrastructure::notification::{AutoConfirmer, StdinConfirmer, TracingNotifier};
use crate::infrastructure::team::{ActionOutcome, TeamCoordinator, TeamSnapshot};

/// Arguments for the show command
#[derive(Args, Clone)]
pub struct ShowArgs {
    /// Lesson track used for progress colors and percentages
    #[arg(long, default_value = "en")]
    pub language: String,
}

/// What a team command prints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<ActionOutcome>,
    snapshot: TeamSnapshot,
}

/// Run a team command
pub async fn run(
    command: Command,
    config: &AppConfig,
    fixture: Option<PathBuf>,
    identity: Option<PathBuf>,
) -> anyhow::Result<()> {
    let identity_path = identity.unwrap_or_else(|| config.identity.path.clone());
    let fixture_path = fixture.unwrap_or_else(|| config.directory.fixture_path.clone());

    let user = FileIdentityStore::new(&identity_path)
        .load()
        .await
        .context("No user identity; run `lesson-teams login <npub>` first")?;

    let directory = Arc::new(InMemoryTeamDirectory::with_fixture(
        DirectoryFixture::load(&fixture_path).await?,
    ));
    directory.set_latency(config.directory.latency());

    let confirmer: Arc<dyn Confirmer> = if command.assume_yes() {
        Arc::new(AutoConfirmer::approve())
    } else {
        Arc::new(StdinConfirmer)
    };

    let coordinator = TeamCoordinator::new(directory.clone(), user)
        .with_notifier(Arc::new(TracingNotifier))
        .with_confirmer(confirmer)
        .with_curriculum(curriculum(&command)?);

    if coordinator.start().await == ActionOutcome::Failed {
        anyhow::bail!("Failed to load team data");
    }

    let outcome = match &command {
        Command::Show(_) => None,
        Command::Accept { invite } => {
            Some(coordinator.accept_invite(&InviteId::new(invite.as_str())).await)
        }
        Command::Reject { invite } => {
            Some(coordinator.reject_invite(&InviteId::new(invite.as_str())).await)
        }
        Command::Delete { team, .. } => Some(coordinator.delete_team(&team_id(team)?).await),
        Command::Leave { team, .. } => Some(coordinator.leave_team(&team_id(team)?).await),
        Command::Login(_) => anyhow::bail!("login is not a team command"),
    };

    let applied = coordinator.process_pending_events().await;
    coordinator.shutdown();
    info!(events = applied, "Applied directory pushes");

    let output = CommandOutput {
        outcome,
        snapshot: coordinator.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    if outcome.is_some_and(|o| o.is_completed()) {
        directory.fixture()?.save(&fixture_path).await?;
        info!(path = %fixture_path.display(), "Directory fixture saved");
    }

    match outcome {
        Some(ActionOutcome::Failed) => anyhow::bail!("Action failed"),
        Some(ActionOutcome::Unavailable) => anyhow::bail!("Action not available for this target"),
        _ => Ok(()),
    }
}

fn curriculum(command: &Command) -> anyhow::Result<Curriculum> {
    match command {
        Command::Show(args) => Curriculum::for_language(&args.language)
            .with_context(|| format!("Unsupported lesson track '{}'", args.language)),
        _ => Ok(Curriculum::english()),
    }
}

fn team_id(value: &str) -> anyhow::Result<TeamId> {
    TeamId::new(value).map_err(|e| anyhow::anyhow!("Invalid team id '{}': {}", value, e))
}
