use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use ipsentinel_common::version::ipsentinel_version;
use ipsentinel_core::db::cleanup_db;
use ipsentinel_core::Services;
use ipsentinel_protocol_http::HttpProtocolServer;
#[cfg(target_os = "linux")]
use sd_notify::NotifyState;
use tracing::*;

use crate::config::{load_config, watch_config};

/// Access log sweeps run at a tenth of the retention period, capped to this.
const MAX_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub(crate) async fn command(cli: &crate::Cli) -> Result<()> {
    let version = ipsentinel_version();
    info!(%version, "IP Sentinel");

    let config = load_config(&cli.config, true)?;
    let services = Services::new(config.clone()).await?;

    let mut protocol_futures = futures::stream::FuturesUnordered::new();
    protocol_futures.push(HttpProtocolServer::new(&services).run());

    tokio::spawn({
        let services = services.clone();
        async move {
            loop {
                let retention = { services.config.lock().await.store.log.retention };
                let interval = (retention / 10).clamp(Duration::from_secs(1), MAX_CLEANUP_INTERVAL);
                match cleanup_db(&mut *services.db.lock().await, &retention).await {
                    Err(error) => error!(?error, "Failed to clean up the access log"),
                    Ok(_) => debug!("Access log cleaned up, next in {:?}", interval),
                }
                tokio::time::sleep(interval).await;
            }
        }
    });

    if console::user_attended() {
        info!("--------------------------------------------");
        info!("IP Sentinel is now running.");
        info!("Open the UI on http://{}", config.store.http.listen);
        info!("--------------------------------------------");
    }

    #[cfg(target_os = "linux")]
    if let Ok(true) = sd_notify::booted() {
        tokio::spawn(async {
            if let Err(error) = async {
                sd_notify::notify(false, &[NotifyState::Ready])?;
                loop {
                    sd_notify::notify(false, &[NotifyState::Watchdog])?;
                    tokio::time::sleep(Duration::from_secs(15)).await;
                }
                #[allow(unreachable_code)]
                Ok::<(), anyhow::Error>(())
            }
            .await
            {
                error!(?error, "Failed to communicate with systemd");
            }
        });
    }

    drop(config);

    tokio::spawn({
        let path = cli.config.clone();
        let config = services.config.clone();
        async move {
            if let Err(error) = watch_config(path, config).await {
                error!(?error, "Config watcher stopped");
            }
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = protocol_futures.next() => {
                match result {
                    Some(Err(error)) => {
                        error!(?error, "HTTP server error");
                        std::process::exit(1);
                    },
                    None => break,
                    _ => (),
                }
            }
        }
    }

    info!("Exiting");
    Ok(())
}
