mod commands;
mod config;
mod logging;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use logging::init_logging;

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    command: Commands,

    #[clap(long, short, default_value = "ipsentinel.yaml", env = "IPSENTINEL_CONFIG")]
    config: PathBuf,
}

#[derive(clap::Subcommand)]
pub(crate) enum Commands {
    /// Run the IP Sentinel server
    Run,
    /// Validate config file
    Check,
    /// Add a user that checks can be attributed to
    CreateUser { username: String },
    /// Import addresses from a text file, one per line
    Import {
        file: PathBuf,
        /// Name recorded as the registering user (defaults to the admin username)
        #[clap(long)]
        added_by: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run => crate::commands::run::command(&cli).await,
        Commands::Check => crate::commands::check::command(&cli).await,
        Commands::CreateUser { username } => {
            crate::commands::create_user::command(&cli, username).await
        }
        Commands::Import { file, added_by } => {
            crate::commands::import::command(&cli, file, added_by.as_deref()).await
        }
    }
}
