use directories::ProjectDirs;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::history::FileStore;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    NoConfigDir,
    #[error("config file not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

/// Where the browsing client finds the catalog server
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_url")]
    pub url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_client_url(),
        }
    }
}

fn default_client_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryConfig {
    /// Overrides the watch history file in the data directory
    pub path: Option<PathBuf>,
}

impl HistoryConfig {
    pub fn path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(FileStore::default_path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TuiConfig {
    /// Approximate pixel height of one terminal row, used to map mouse
    /// clicks onto the player's pixel geometry
    #[serde(default = "default_cell_height_px")]
    pub cell_height_px: f64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            cell_height_px: default_cell_height_px(),
        }
    }
}

fn default_cell_height_px() -> f64 {
    16.0
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Like [`Config::load`], but a missing file means defaults
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::NotFound(path)) => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(ConfigError::NoConfigDir) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "cinemahub")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.client.url)
            .map_err(|e| ConfigError::ValidationError(format!("client.url is invalid: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::ValidationError(
                "client.url must start with http:// or https://".to_string(),
            ));
        }

        if !self.tui.cell_height_px.is_finite() || self.tui.cell_height_px <= 0.0 {
            return Err(ConfigError::ValidationError(
                "tui.cell_height_px must be a positive number".to_string(),
            ));
        }

        Ok(())
    }
}
