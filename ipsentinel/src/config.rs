use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use ipsentinel_common::helpers::fs::secure_file;
use ipsentinel_common::{IpSentinelConfig, IpSentinelConfigStore};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, Mutex};
use tracing::*;

pub fn load_config(path: &Path, secure: bool) -> Result<IpSentinelConfig> {
    if secure {
        secure_file(path).context("Could not secure config")?;
    }

    let store: IpSentinelConfigStore = Config::builder()
        .add_source(File::from(path))
        .add_source(
            Environment::with_prefix("IPSENTINEL")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("Could not load config")?
        .try_deserialize()
        .context("Could not parse config")?;

    let config = IpSentinelConfig {
        store,
        paths_relative_to: path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    config.validate();

    info!(
        "Using config: {path:?} (listen: {}, seed addresses: {})",
        config.store.http.listen,
        config.store.registry.seed.len(),
    );
    Ok(config)
}

pub async fn watch_config<P: AsRef<Path>>(
    path: P,
    config: Arc<Mutex<IpSentinelConfig>>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(1);
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.blocking_send(res);
        },
        notify::Config::default(),
    )?;
    watcher.watch(path.as_ref(), RecursiveMode::NonRecursive)?;

    loop {
        match rx.recv().await {
            Some(Ok(event)) => {
                if event.kind.is_modify() {
                    match load_config(path.as_ref(), false) {
                        Ok(new_config) => {
                            *(config.lock().await) = new_config;
                            info!("Reloaded config");
                        }
                        Err(error) => error!(?error, "Failed to reload config"),
                    }
                }
            }
            Some(Err(error)) => error!(?error, "Failed to watch config"),
            None => anyhow::bail!("Config watch failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    // the environment is process-wide; tests that load config take turns
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_config_from_yaml() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipsentinel.yaml");
        std::fs::write(
            &path,
            "database_url: sqlite:registry\n\
             http:\n  listen: 127.0.0.1:9100\n  session_max_age: 10m\n\
             admin:\n  username: root\n  password: hunter2\n\
             registry:\n  seed:\n    - 10.0.0.1\n",
        )
        .unwrap();

        let config = load_config(&path, false).unwrap();
        assert_eq!(config.paths_relative_to, dir.path());
        assert_eq!(config.store.database_url.expose_secret(), "sqlite:registry");
        assert_eq!(config.store.http.listen.to_string(), "127.0.0.1:9100");
        assert_eq!(config.store.http.session_max_age, Duration::from_secs(600));
        assert!(config.store.admin.accepts("root", "hunter2"));
        assert_eq!(config.store.registry.seed, vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn test_load_config_rejects_garbage() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipsentinel.yaml");
        std::fs::write(&path, "http:\n  listen: not-an-address\n").unwrap();

        assert!(load_config(&path, false).is_err());
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipsentinel.yaml");
        std::fs::write(&path, "admin:\n  username: root\n  password: from-file\n").unwrap();

        std::env::set_var("IPSENTINEL_ADMIN__PASSWORD", "from-env");
        std::env::set_var("IPSENTINEL_HTTP__TRUST_X_FORWARDED_HEADERS", "true");
        let config = load_config(&path, false);
        std::env::remove_var("IPSENTINEL_ADMIN__PASSWORD");
        std::env::remove_var("IPSENTINEL_HTTP__TRUST_X_FORWARDED_HEADERS");

        let config = config.unwrap();
        assert!(config.store.admin.accepts("root", "from-env"));
        assert!(!config.store.admin.accepts("root", "from-file"));
        assert!(config.store.http.trust_x_forwarded_headers);
    }

    #[tokio::test]
    async fn test_watch_config_reloads_on_change() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipsentinel.yaml");
        std::fs::write(&path, "admin:\n  username: root\n").unwrap();

        let config = Arc::new(Mutex::new(load_config(&path, false).unwrap()));
        let watcher = tokio::spawn(watch_config(path.clone(), config.clone()));
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(&path, "admin:\n  username: operator\n").unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if config.lock().await.store.admin.username == "operator" {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await;
        watcher.abort();
        assert!(reloaded.is_ok(), "config was not reloaded");
    }
}
