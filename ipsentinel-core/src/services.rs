use std::sync::Arc;

use anyhow::Result;
use ipsentinel_common::IpSentinelConfig;
use sea_orm::DatabaseConnection;
use tokio::sync::Mutex;

use crate::db::{connect_to_db, populate_db};

#[derive(Clone)]
pub struct Services {
    pub db: Arc<Mutex<DatabaseConnection>>,
    pub config: Arc<Mutex<IpSentinelConfig>>,
}

impl Services {
    pub async fn new(config: IpSentinelConfig) -> Result<Self> {
        let mut db = connect_to_db(&config).await?;
        populate_db(&mut db, &config).await?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config: Arc::new(Mutex::new(config)),
        })
    }
}
