//! Migrate command - applies or reverts the PostgreSQL schema

use anyhow::{bail, Context};
use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{
    connect_pool, run_storage_migrations, migrations::storage_migrations, PostgresMigrator,
    StorageConfig,
};

#[derive(Args, Clone, Debug)]
pub struct MigrateArgs {
    /// Revert the most recently applied migration instead
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    super::init_command_logging(&config);

    let StorageConfig::Postgres { config: pg, .. } = StorageConfig::from_settings(&config.storage)?
    else {
        bail!("migrate requires storage.backend = \"postgres\"");
    };

    let pool = connect_pool(&pg).await.context("Failed to connect to PostgreSQL")?;

    if args.revert {
        let migrator = PostgresMigrator::new(pool.clone());
        match migrator.revert_last(&storage_migrations()).await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("No migrations to revert"),
        }
    } else {
        let applied = run_storage_migrations(&pool).await?;
        info!(applied, "Migrations complete");
    }

    pool.close().await;
    Ok(())
}
