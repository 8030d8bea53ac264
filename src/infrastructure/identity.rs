//! Resolves the acting user's identity from persistent client storage

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{DomainError, Npub};

/// Key under which the client stores the user identity
pub const LOCAL_NPUB_KEY: &str = "local_npub";

/// JSON key/value file holding client-side settings
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the identity stored under [`LOCAL_NPUB_KEY`]
    pub async fn load(&self) -> Result<Npub, DomainError> {
        let entries = self.read_entries().await?;

        let value = entries.get(LOCAL_NPUB_KEY).ok_or_else(|| {
            DomainError::configuration(format!(
                "No '{}' entry in '{}'",
                LOCAL_NPUB_KEY,
                self.path.display()
            ))
        })?;

        let value = value.as_str().ok_or_else(|| {
            DomainError::invalid_id(format!("Stored '{}' is not a string", LOCAL_NPUB_KEY))
        })?;

        let npub = Npub::new(value)
            .map_err(|e| DomainError::invalid_id(format!("Stored identity is invalid: {}", e)))?;

        debug!(npub = %npub, "Loaded user identity");
        Ok(npub)
    }

    /// Store `npub` under [`LOCAL_NPUB_KEY`], keeping other entries
    pub async fn store(&self, npub: &Npub) -> Result<(), DomainError> {
        let mut entries = if tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            self.read_entries().await?
        } else {
            Map::new()
        };

        entries.insert(LOCAL_NPUB_KEY.to_string(), Value::String(npub.to_string()));

        let contents = serde_json::to_string_pretty(&entries)
            .map_err(|e| DomainError::internal(format!("Failed to serialize identity: {}", e)))?;

        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to write identity file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn read_entries(&self) -> Result<Map<String, Value>, DomainError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read identity file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to parse identity file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}
