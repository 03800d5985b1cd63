//! Settings loaded from the environment, and the explicit store config
//! handed to the store and session clients.

use config::{Config, ConfigError, Environment};
use reqwest::Url;
use secrecy::SecretString;
use serde::Deserialize;

use crate::app::views::{DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_VIEWS};

pub const ENV_PREFIX: &str = "TASKBOARD";
pub const DEFAULT_TABLE: &str = "tasks";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub log: LogSettings,
    pub views: ViewSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub url: String,
    pub anon_key: SecretString,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

/// Limits on per-visitor board views.
#[derive(Debug, Deserialize, Clone)]
pub struct ViewSettings {
    pub idle_secs: i64,
    pub max_views: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

impl Settings {
    /// Load from `TASKBOARD__*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    pub fn from_environment(env: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("store.table", DEFAULT_TABLE)?
            .set_default("log.level", "info")?
            .set_default("views.idle_secs", DEFAULT_IDLE_TIMEOUT_SECS)?
            .set_default("views.max_views", DEFAULT_MAX_VIEWS as i64)?
            .add_source(env)
            .build()?;

        s.try_deserialize()
    }

    pub fn store_config(&self) -> Result<StoreConfig, ConfigError> {
        let url = Url::parse(&self.store.url)
            .map_err(|e| ConfigError::Message(format!("invalid store.url `{}`: {e}", self.store.url)))?;
        if url.host_str().is_none() {
            return Err(ConfigError::Message(format!(
                "store.url `{}` has no host",
                self.store.url
            )));
        }
        Ok(StoreConfig::new(url, self.store.anon_key.clone()).with_table(self.store.table.clone()))
    }
}

/// Network location and public credential of the remote store.
///
/// Built once at startup and injected into whichever client needs it.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: Url,
    pub anon_key: SecretString,
    pub table: String,
}

impl StoreConfig {
    pub fn new(url: Url, anon_key: SecretString) -> Self {
        Self {
            url,
            anon_key,
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// First DNS label of the store host (`abcd` for `abcd.supabase.co`).
    pub fn project_ref(&self) -> &str {
        self.url
            .host_str()
            .and_then(|host| host.split('.').next())
            .unwrap_or_default()
    }

    /// Resolve `path` against the store base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, EndpointError> {
        let mut base = self.url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| EndpointError {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot build endpoint `{path}`: {reason}")]
pub struct EndpointError {
    pub path: String,
    pub reason: String,
}
