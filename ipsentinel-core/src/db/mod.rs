use std::time::Duration;

use anyhow::Result;
use ipsentinel_common::helpers::fs::secure_file;
use ipsentinel_common::{IpSentinelConfig, IpSentinelError};
use ipsentinel_db_migrations::migrate_database;
use sea_orm::sea_query::{LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, ConnectOptions, Database, DatabaseConnection, TransactionTrait};
use tracing::*;

use crate::{access_log, registry};

pub async fn connect_to_db(config: &IpSentinelConfig) -> Result<DatabaseConnection> {
    let mut url = url::Url::parse(&config.store.database_url.expose_secret()[..])?;
    if url.scheme() == "sqlite" {
        let path = url.path();
        let mut abs_path = config.paths_relative_to.clone();
        abs_path.push(path);
        abs_path.push("db.sqlite3");

        if let Some(parent) = abs_path.parent() {
            std::fs::create_dir_all(parent)?
        }

        url.set_path(
            abs_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Failed to convert database path to string"))?,
        );

        url.set_query(Some("mode=rwc"));

        let db = Database::connect(ConnectOptions::new(url.to_string())).await?;
        db.begin().await?.commit().await?;
        drop(db);

        secure_file(&abs_path)?;
    }

    let mut opt = ConnectOptions::new(url.to_string());
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(60 * 30))
        .sqlx_logging(true);

    let connection = Database::connect(opt).await?;

    migrate_database(&connection).await?;
    Ok(connection)
}

pub async fn populate_db(
    db: &mut DatabaseConnection,
    config: &IpSentinelConfig,
) -> Result<(), IpSentinelError> {
    let seed = &config.store.registry.seed;
    if seed.is_empty() {
        return Ok(());
    }

    let added = registry::seed(&*db, seed, &config.store.admin.username).await?;
    if added > 0 {
        info!(added, "Seeded the IP registry");
    }
    Ok(())
}

pub async fn cleanup_db(db: &mut DatabaseConnection, retention: &Duration) -> Result<()> {
    let removed = access_log::cleanup(&*db, retention).await?;
    if removed > 0 {
        info!(removed, "Removed expired access log entries");
    }
    Ok(())
}

/// `column LIKE '%needle%'` with `%`, `_` and `\` in `needle` matched literally.
pub(crate) fn contains_literal<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    column.like(LikeExpr::new(pattern).escape('\\'))
}

#[cfg(test)]
pub(crate) async fn connect_to_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    #[allow(clippy::unwrap_used)]
    let db = Database::connect(opt).await.unwrap();
    #[allow(clippy::unwrap_used)]
    migrate_database(&db).await.unwrap();
    db
}
