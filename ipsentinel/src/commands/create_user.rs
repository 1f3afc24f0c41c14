use anyhow::Result;
use ipsentinel_common::IpSentinelError;
use ipsentinel_core::{users, Services};
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli, username: &str) -> Result<()> {
    let config = load_config(&cli.config, true)?;
    let services = Services::new(config).await?;
    let db = services.db.lock().await;

    match users::create(&*db, username).await {
        Ok(user) => info!(id = %user.id, username = %user.username, "Done"),
        Err(IpSentinelError::UsernameTaken(username)) => {
            warn!(%username, "User already exists")
        }
        Err(error) => return Err(error.into()),
    }
    Ok(())
}
