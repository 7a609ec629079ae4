//! Layered server configuration.
//!
//! Precedence, lowest first: built-in defaults, the YAML file given with
//! `--config`, `APP__`-prefixed environment variables (`__` separates nested
//! keys, e.g. `APP__SERVER__BIND_ADDR`), then command-line overrides.

use std::path::Path;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use preferences::PreferencesConfig;
use preferences::config::{DatabaseConfig, StoreBackend};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "APP__";
pub const MOCK_DSN: &str = "sqlite::memory:";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub preferences: PreferencesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            request_timeout_secs: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl AppConfig {
    /// Merge defaults, the optional YAML file and the environment.
    ///
    /// # Errors
    /// Fails when `path` is not a file or the merged configuration does not
    /// deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    /// `port` replaces the port of `server.bind_addr`; `mock` swaps the store
    /// for a migrated in-memory SQLite database.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, mock: bool) {
        if let Some(port) = port {
            self.server.bind_addr = with_port(&self.server.bind_addr, port);
        }
        if mock {
            self.preferences.store.backend = StoreBackend::Database(DatabaseConfig {
                dsn: MOCK_DSN.to_owned(),
                username: None,
                password: None,
                max_connections: 1,
                run_migrations: true,
            });
        }
    }

    /// Effective configuration as YAML, secrets redacted.
    ///
    /// # Errors
    /// Fails when serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("serializing configuration")
    }
}

fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr.rsplit_once(':').map_or(bind_addr, |(host, _)| host);
    format!("{host}:{port}")
}
