//! Configuration for the redfly aggregator.
//!
//! A TOML file layered under `REDFLY_` environment variables, credential
//! resolution for plugins and device targets, and translation into the
//! `redfly_api` and `redfly_core` types the CLI wires together.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use redfly_api::{AuthType, Plugin, StatusPolling, TlsMode, TransportConfig, UrlTranslation};
use redfly_core::{MemoryInventory, Target};

/// Prefix for environment overrides; nested keys are joined with `__`.
pub const ENV_PREFIX: &str = "REDFLY_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for {entity} '{name}'")]
    NoCredentials { entity: &'static str, name: String },

    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// South-bound HTTP settings.
    #[serde(default)]
    pub transport: TransportSection,

    /// Path segment translation tables.
    #[serde(default)]
    pub url_translation: UrlTranslationSection,

    /// Plugin health-check policy.
    #[serde(default)]
    pub plugin_status_polling: PollingSection,

    /// Plugins keyed by plugin id.
    #[serde(default)]
    pub plugins: HashMap<String, PluginEntry>,

    /// Device targets keyed by device UUID.
    #[serde(default)]
    pub targets: HashMap<String, TargetEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransportSection {
    /// URL scheme for plugin endpoints.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept any plugin certificate.
    #[serde(default)]
    pub insecure: bool,

    /// Path to the CA that signed plugin certificates.
    pub ca_cert: Option<PathBuf>,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            timeout_secs: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

/// Translation tables. A table left out keeps its default; a table that is
/// present replaces the default entirely (an empty table disables it).
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UrlTranslationSection {
    /// Plugin-form segment run → aggregator-form segment run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north_bound: Option<IndexMap<String, String>>,

    /// Aggregator-form segment run → plugin-form segment run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub south_bound: Option<IndexMap<String, String>>,
}

fn default_north_bound() -> IndexMap<String, String> {
    IndexMap::from([("ODIM".to_owned(), "redfish".to_owned())])
}

fn default_south_bound() -> IndexMap<String, String> {
    IndexMap::from([("redfish".to_owned(), "ODIM".to_owned())])
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PollingSection {
    #[serde(default = "default_max_retry")]
    pub max_retry_attempt: u32,

    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    #[serde(default = "default_response_timeout")]
    pub response_timeout_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            max_retry_attempt: default_max_retry(),
            retry_interval_secs: default_retry_interval(),
            response_timeout_secs: default_response_timeout(),
        }
    }
}

fn default_scheme() -> String {
    "https".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_retry() -> u32 {
    3
}
fn default_retry_interval() -> u64 {
    1
}
fn default_response_timeout() -> u64 {
    3
}

/// A south-bound plugin.
#[derive(Debug, Deserialize, Serialize)]
pub struct PluginEntry {
    pub ip: String,

    pub port: u16,

    pub username: String,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// "XAuthToken" or "BasicAuth" (case-insensitive).
    #[serde(default = "default_auth_type")]
    pub preferred_auth_type: String,
}

fn default_auth_type() -> String {
    AuthType::BasicAuth.as_str().into()
}

/// A managed device behind a plugin.
#[derive(Debug, Deserialize, Serialize)]
pub struct TargetEntry {
    pub plugin_id: String,

    pub manager_address: String,

    pub username: String,

    /// Stored password (plaintext unless a decryptor says otherwise).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "redfly", "redfly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("redfly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a password: the named env var first, then the plaintext value.
fn resolve_password(
    password_env: Option<&str>,
    password: Option<&str>,
    entity: &'static str,
    name: &str,
) -> Result<String, ConfigError> {
    if let Some(env_name) = password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(val);
        }
    }

    if let Some(pw) = password {
        return Ok(pw.to_owned());
    }

    Err(ConfigError::NoCredentials {
        entity,
        name: name.into(),
    })
}

// ── Translation to runtime types ────────────────────────────────────

impl Config {
    pub fn transport_config(&self) -> TransportConfig {
        let tls = if self.transport.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.transport.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.transport.timeout_secs),
        }
    }

    pub fn url_translation(&self) -> UrlTranslation {
        let section = &self.url_translation;
        let north_bound = section
            .north_bound
            .clone()
            .unwrap_or_else(default_north_bound);
        let south_bound = section
            .south_bound
            .clone()
            .unwrap_or_else(default_south_bound);
        UrlTranslation::new(&north_bound, &south_bound)
    }

    pub fn status_polling(&self) -> StatusPolling {
        let p = &self.plugin_status_polling;
        StatusPolling {
            max_retry_attempt: p.max_retry_attempt,
            retry_interval: Duration::from_secs(p.retry_interval_secs),
            response_timeout: Duration::from_secs(p.response_timeout_secs),
        }
    }

    /// Build the runtime [`Plugin`] for `plugin_id`.
    pub fn plugin(&self, plugin_id: &str) -> Result<Plugin, ConfigError> {
        let entry = self
            .plugins
            .get(plugin_id)
            .ok_or_else(|| ConfigError::UnknownPlugin(plugin_id.into()))?;

        let preferred_auth_type: AuthType =
            entry
                .preferred_auth_type
                .parse()
                .map_err(|reason| ConfigError::Validation {
                    field: format!("plugins.{plugin_id}.preferred_auth_type"),
                    reason,
                })?;

        let password = resolve_password(
            entry.password_env.as_deref(),
            entry.password.as_deref(),
            "plugin",
            plugin_id,
        )?;

        Ok(Plugin {
            id: plugin_id.to_owned(),
            ip: entry.ip.clone(),
            port: entry.port,
            username: entry.username.clone(),
            password: SecretString::from(password),
            preferred_auth_type,
        })
    }

    /// Build the runtime [`Target`] for `device_uuid`.
    pub fn target(&self, device_uuid: &str) -> Result<Target, ConfigError> {
        let entry = self
            .targets
            .get(device_uuid)
            .ok_or_else(|| ConfigError::Validation {
                field: "targets".into(),
                reason: format!("no target with uuid '{device_uuid}'"),
            })?;

        if !self.plugins.contains_key(&entry.plugin_id) {
            return Err(ConfigError::UnknownPlugin(entry.plugin_id.clone()));
        }

        let password = resolve_password(
            entry.password_env.as_deref(),
            entry.password.as_deref(),
            "target",
            device_uuid,
        )?;

        Ok(Target {
            device_uuid: device_uuid.to_owned(),
            plugin_id: entry.plugin_id.clone(),
            manager_address: entry.manager_address.clone(),
            username: entry.username.clone(),
            password: password.into_bytes(),
        })
    }

    /// Populate an in-memory inventory with every configured plugin and
    /// target.
    pub fn inventory(&self) -> Result<MemoryInventory, ConfigError> {
        let inventory = MemoryInventory::new();
        for id in self.plugins.keys() {
            inventory.insert_plugin(self.plugin(id)?);
        }
        for uuid in self.targets.keys() {
            inventory.insert_target(self.target(uuid)?);
        }
        Ok(inventory)
    }
}
