//! CLI module for keygate
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `migrate`: apply or revert PostgreSQL migrations
//! - `issue-key`: issue a key from the command line
//! - `admin-token`: mint a token for the admin API

pub mod admin_token;
pub mod issue_key;
pub mod migrate;
pub mod serve;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// keygate - API key issuance, verification and usage metering
#[derive(Parser)]
#[command(name = "keygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply pending PostgreSQL migrations
    Migrate(migrate::MigrateArgs),

    /// Issue a new API key and print it once
    IssueKey(issue_key::IssueKeyArgs),

    /// Mint an admin token for the admin API
    AdminToken(admin_token::AdminTokenArgs),
}

/// Load `.env` and the layered configuration
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    AppConfig::load().context("Failed to load configuration")
}

/// Plain stderr logging for one-shot commands
pub(crate) fn init_command_logging(config: &AppConfig) {
    logging::init_logging(&(&config.logging).into());
}
