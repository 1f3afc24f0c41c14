use std::path::Path;

use anyhow::{Context, Result};
use ipsentinel_core::{registry, Services};
use tracing::*;

use crate::config::load_config;

pub(crate) async fn command(cli: &crate::Cli, file: &Path, added_by: Option<&str>) -> Result<()> {
    let config = load_config(&cli.config, true)?;
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading addresses from '{}'", file.display()))?;

    let added_by = added_by
        .map(str::to_owned)
        .unwrap_or_else(|| config.store.admin.username.clone());

    let services = Services::new(config).await?;
    let db = services.db.lock().await;
    let stats = registry::import(&*db, &text, &added_by).await?;

    info!(
        added = stats.added,
        existing = stats.existing,
        errors = stats.errors,
        "Imported {}",
        file.display()
    );
    Ok(())
}
