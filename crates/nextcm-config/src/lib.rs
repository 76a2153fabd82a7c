//! Configuration for the Central Manager client.
//!
//! TOML file + `NEXTCM_`-prefixed environment variables, resolved into
//! `nextcm_api::ClientConfig`. Credentials may come entirely from the
//! environment, keeping them out of the config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use nextcm_api::{ClientConfig, TlsMode};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured")]
    NoCredentials,

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

// ── Config struct ───────────────────────────────────────────────────

/// On-disk + environment configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Device name or address.
    pub device: Option<String>,

    /// Username for password login.
    pub username: Option<String>,

    /// Password (plaintext -- prefer `NEXTCM_PASSWORD` in the environment).
    pub password: Option<String>,

    /// Skip TLS certificate validation (self-signed installs).
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Debug artifact name receiving raw API error bodies.
    pub debug: Option<String>,

    /// Override for the API specification document location.
    pub spec_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            username: None,
            password: None,
            insecure: false,
            ca_cert: None,
            timeout: default_timeout(),
            debug: None,
            spec_path: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "nextcm", "nextcm").map_or_else(
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
    p.push("nextcm");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEXTCM_"))
}

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let config: Config = figment(&config_path()).extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation to ClientConfig ─────────────────────────────────────

impl Config {
    /// Resolve username + password, or fail if either is missing.
    pub fn resolve_credentials(&self) -> Result<(String, SecretString), ConfigError> {
        let username = self.username.clone().ok_or(ConfigError::NoCredentials)?;
        let password = self
            .password
            .clone()
            .map(SecretString::from)
            .ok_or(ConfigError::NoCredentials)?;
        Ok((username, password))
    }

    /// Build a `ClientConfig` from the resolved configuration.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let device = self.device.clone().ok_or_else(|| ConfigError::Validation {
            field: "device".into(),
            reason: "device address is required".into(),
        })?;

        let (username, password) = self.resolve_credentials()?;

        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        let mut client = ClientConfig::new(device, username, password);
        client.tls = tls;
        client.timeout = Duration::from_secs(self.timeout);
        client.debug = self.debug.clone();
        client.spec_path = self.spec_path.clone();
        Ok(client)
    }
}
