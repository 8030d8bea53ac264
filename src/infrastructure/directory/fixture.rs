//! JSON snapshot of a directory's contents

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DomainError, Invite, ProgressEntry, Team, TeamId};

/// Serializable contents of a team directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryFixture {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub invites: Vec<Invite>,
    /// Member progress per team, stored under the team's creator
    #[serde(default)]
    pub progress: BTreeMap<TeamId, Vec<ProgressEntry>>,
}

impl DirectoryFixture {
    /// Read a fixture file; a missing file yields an empty fixture
    pub async fn load(path: &Path) -> Result<Self, DomainError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Fixture file not found, starting empty");
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            DomainError::storage(format!("Failed to read fixture '{}': {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            DomainError::storage(format!("Failed to parse fixture '{}': {}", path.display(), e))
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), DomainError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::internal(format!("Failed to serialize fixture: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!(
                    "Failed to create fixture directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(path, contents).await.map_err(|e| {
            DomainError::storage(format!("Failed to write fixture '{}': {}", path.display(), e))
        })
    }
}
