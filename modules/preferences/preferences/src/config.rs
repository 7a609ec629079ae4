//! Configuration of the preferences module.

use prefkit_auth::AuthConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Widest name the database schema stores.
pub const MAX_STORED_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PreferencesConfig {
    pub access: AccessConfig,
    pub store: StoreConfig,
    /// Upper bound, in characters, of preference and view names. Values above
    /// [`MAX_STORED_NAME_LENGTH`] are clamped.
    pub max_name_length: usize,
    pub auth: AuthConfig,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            access: AccessConfig::default(),
            store: StoreConfig::default(),
            max_name_length: MAX_STORED_NAME_LENGTH,
            auth: AuthConfig::default(),
        }
    }
}

impl PreferencesConfig {
    /// `max_name_length` bounded by what the store can hold.
    #[must_use]
    pub fn name_length_limit(&self) -> usize {
        self.max_name_length.min(MAX_STORED_NAME_LENGTH)
    }
}

/// Who may read preferences and who may change anyone's.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AccessConfig {
    /// Scope every caller must hold.
    pub read_scope: String,
    /// Roles allowed to modify preferences of other owners.
    pub elevated_roles: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            read_scope: "cartera.read".to_owned(),
            elevated_roles: vec!["ADMINLEGO".to_owned()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local graph, lost on restart.
    #[default]
    Memory,
    Database(DatabaseConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://...` or `postgres://host:port/db`.
    pub dsn: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_redacted_opt"
    )]
    pub password: Option<SecretString>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_run_migrations() -> bool {
    true
}

#[allow(clippy::ref_option)]
fn serialize_redacted_opt<S>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(secret) => prefkit_auth::config::serialize_redacted(secret, serializer),
        None => serializer.serialize_none(),
    }
}

impl DatabaseConfig {
    /// The DSN with `username` and `password`, when configured, placed in
    /// its user-info part.
    #[must_use]
    pub fn connection_url(&self) -> String {
        let Some(username) = self.username.as_deref() else {
            return self.dsn.clone();
        };
        let Some((scheme, rest)) = self.dsn.split_once("://") else {
            return self.dsn.clone();
        };
        let host = strip_user_info(rest);
        let user = urlencoding::encode(username);
        match &self.password {
            Some(password) => {
                let password = urlencoding::encode(password.expose_secret());
                format!("{scheme}://{user}:{password}@{host}")
            }
            None => format!("{scheme}://{user}@{host}"),
        }
    }

    /// The DSN with any credentials masked, for logs.
    #[must_use]
    pub fn redacted_dsn(&self) -> String {
        match self.dsn.split_once("://") {
            Some((scheme, rest)) if rest.len() != strip_user_info(rest).len() => {
                format!("{scheme}://<redacted>@{}", strip_user_info(rest))
            }
            _ => self.dsn.clone(),
        }
    }
}

fn strip_user_info(rest: &str) -> &str {
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => &rest[at + 1..],
        None => rest,
    }
}

/// Retry of store calls failing with a transient error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryConfig {
    /// Total calls, the first one included.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 50,
            max_backoff_ms: 1000,
        }
    }
}
