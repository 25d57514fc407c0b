//! Issue-key command - issues a key without going through the HTTP API

use anyhow::bail;
use clap::Args;
use tracing::info;

use crate::infrastructure::storage::StorageType;

#[derive(Args, Clone, Debug)]
pub struct IssueKeyArgs {
    /// Display name for the key
    #[arg(long)]
    pub name: String,

    /// Owning user, if any
    #[arg(long)]
    pub user_id: Option<String>,
}

/// Issue a key and print the raw credential to stdout
pub async fn run(args: IssueKeyArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::init_command_logging(&config);

    let state = crate::create_app_state_with_config(&config).await?;

    if state.storage.storage_type() == StorageType::InMemory {
        bail!("issue-key needs persistent storage; set storage.backend = \"postgres\"");
    }

    let issued = state
        .api_key_service
        .issue(&args.name, args.user_id.as_deref())
        .await?;

    info!(key_id = %issued.id, "Key issued; it will not be shown again");
    println!("{}", issued.key);

    state.storage.close().await;
    Ok(())
}
