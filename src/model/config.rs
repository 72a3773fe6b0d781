use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub data_source_url: String,
    pub core_version: String,
    pub actions_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    pub fn load() -> Result<Self> {
        match user_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::from_layers(None),
        }
    }

    /// Load the defaults overlaid with the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let user_str = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_layers(Some(&user_str))
            .with_context(|| format!("parsing config {}", path.display()))
    }

    /// The compiled-in defaults alone.
    pub fn defaults() -> Result<Self> {
        Self::from_layers(None)
    }

    fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULTS)?;
        if let Some(user) = user {
            let overlay: toml::Table = toml::from_str(user)?;
            merge_tables(&mut merged, overlay);
        }

        let config: AppConfig = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network.idle_timeout_secs)
    }
}

/// Where the daily log files go.
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "component-manager")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("component-manager"))
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "component-manager")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(nested) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, nested);
                continue;
            }
            base.insert(key, toml::Value::Table(nested));
        } else {
            base.insert(key, value);
        }
    }
}
