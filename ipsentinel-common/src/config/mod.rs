mod defaults;

use std::path::PathBuf;
use std::time::Duration;

use defaults::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{validate_ipv4, ListenEndpoint, Secret};

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct HttpConfig {
    #[serde(default = "_default_http_listen")]
    #[schemars(with = "String")]
    pub listen: ListenEndpoint,

    #[serde(default = "_default_false")]
    pub trust_x_forwarded_headers: bool,

    #[serde(default = "_default_session_max_age", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub session_max_age: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen: _default_http_listen(),
            trust_x_forwarded_headers: false,
            session_max_age: _default_session_max_age(),
        }
    }
}

/// The single credential that unlocks the admin console.
#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct AdminConfig {
    #[serde(default = "_default_admin_username")]
    pub username: String,

    #[serde(default = "_default_admin_password")]
    #[schemars(with = "String")]
    pub password: Secret<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: _default_admin_username(),
            password: _default_admin_password(),
        }
    }
}

impl AdminConfig {
    pub fn accepts(&self, username: &str, password: &str) -> bool {
        // evaluate both to avoid leaking which half was wrong through timing
        let username_ok = self.username == username;
        let password_ok = self.password.matches(password);
        username_ok && password_ok
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct LogConfig {
    /// How long access log entries are kept.
    #[serde(default = "_default_retention", with = "humantime_serde")]
    #[schemars(with = "String")]
    pub retention: Duration,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            retention: _default_retention(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, JsonSchema)]
pub struct RegistryConfig {
    /// Addresses inserted on startup when the registry is empty.
    #[serde(default = "_default_empty_vec::<String>")]
    pub seed: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, JsonSchema)]
pub struct IpSentinelConfigStore {
    #[serde(default = "_default_database_url")]
    #[schemars(with = "String")]
    pub database_url: Secret<String>,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Default for IpSentinelConfigStore {
    fn default() -> Self {
        Self {
            database_url: _default_database_url(),
            http: <_>::default(),
            admin: <_>::default(),
            log: <_>::default(),
            registry: <_>::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IpSentinelConfig {
    pub store: IpSentinelConfigStore,
    pub paths_relative_to: PathBuf,
}

impl IpSentinelConfig {
    pub fn validate(&self) {
        if self.store.admin.password.matches(_default_admin_password().expose_secret()) {
            warn!("The admin console is using the default password - set `admin.password` in the config file.");
        }
        for address in &self.store.registry.seed {
            if let Err(error) = validate_ipv4(address) {
                warn!(%error, "Ignoring invalid `registry.seed` entry");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_document() {
        let store: IpSentinelConfigStore = serde_json::from_str("{}").unwrap();
        assert_eq!(store.database_url.expose_secret(), "sqlite:data/db");
        assert_eq!(store.http.listen.port(), 8888);
        assert_eq!(store.http.session_max_age, Duration::from_secs(1800));
        assert_eq!(store.log.retention, Duration::from_secs(90 * 24 * 3600));
        assert_eq!(store.admin.username, "admin");
        assert!(store.registry.seed.is_empty());
    }

    #[test]
    fn test_overrides() {
        let store: IpSentinelConfigStore = serde_json::from_str(
            r#"{
                "http": {"listen": "127.0.0.1:9000", "session_max_age": "1h"},
                "admin": {"username": "root", "password": "s3cret"},
                "log": {"retention": "7days"},
                "registry": {"seed": ["10.0.0.1"]}
            }"#,
        )
        .unwrap();
        assert_eq!(store.http.listen.to_string(), "127.0.0.1:9000");
        assert_eq!(store.http.session_max_age, Duration::from_secs(3600));
        assert_eq!(store.log.retention, Duration::from_secs(7 * 24 * 3600));
        assert_eq!(store.registry.seed, vec!["10.0.0.1".to_string()]);
        assert!(store.admin.accepts("root", "s3cret"));
        assert!(!store.admin.accepts("root", "admin"));
        assert!(!store.admin.accepts("admin", "s3cret"));
    }
}
