//! Login command - stores the user identity in client storage

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::domain::Npub;
use crate::infrastructure::identity::FileIdentityStore;

/// Arguments for the login command
#[derive(Args, Clone)]
pub struct LoginArgs {
    /// Public identity (npub) to act as
    pub npub: String,
}

pub async fn run(
    args: LoginArgs,
    config: &AppConfig,
    identity: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    let npub = Npub::new(args.npub).map_err(|e| anyhow::anyhow!("Invalid npub: {}", e))?;
    let path = identity.unwrap_or_else(|| config.identity.path.clone());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    FileIdentityStore::new(&path).store(&npub).await?;
    info!(npub = %npub, path = %path.display(), "Identity stored");
    println!("Logged in as {}", npub);

    Ok(())
}
