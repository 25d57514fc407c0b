use clap::Parser;
use keygate::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate(args) => cli::migrate::run(args).await,
        Command::IssueKey(args) => cli::issue_key::run(args).await,
        Command::AdminToken(args) => cli::admin_token::run(args),
    }
}
