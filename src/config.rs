//! Layered configuration for Tasker.
//!
//! Settings are read from `tasker.toml`, then overridden by environment
//! variables, then by command-line flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! base_url = "http://localhost:8000/api"
//! token = "..."
//! timeout_secs = 30
//!
//! [board]
//! activation_distance = 8.0
//! default_project = 1
//! ```
//!
//! The file is looked up at `./.tasker/tasker.toml`, then in the user's
//! config directory (`~/.config/tasker/tasker.toml` on Linux).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::drag::DEFAULT_ACTIVATION_DISTANCE;

pub const CONFIG_FILE: &str = "tasker.toml";

pub const ENV_API_URL: &str = "TASKER_API_URL";
pub const ENV_TOKEN: &str = "TASKER_TOKEN";
pub const ENV_PROJECT: &str = "TASKER_PROJECT";

/// Task API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Board behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSection {
    /// Pointer movement in px before a press becomes a drag
    #[serde(default = "default_activation_distance")]
    pub activation_distance: f64,
    /// Project opened when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_project: Option<i64>,
}

fn default_activation_distance() -> f64 {
    DEFAULT_ACTIVATION_DISTANCE
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            activation_distance: default_activation_distance(),
            default_project: None,
        }
    }
}

/// The complete tasker.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskerToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub board: BoardSection,
}

impl TaskerToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse tasker.toml")
    }

    /// Load `path`, or defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize tasker.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// `./.tasker/tasker.toml` under `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".tasker").join(CONFIG_FILE)
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tasker").join(CONFIG_FILE))
}

/// First existing config file: local, then per-user.
pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
    let local = local_config_path(dir);
    if local.exists() {
        return Some(local);
    }
    user_config_path().filter(|p| p.exists())
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
}

/// Resolved configuration: file → environment → CLI.
#[derive(Debug, Clone)]
pub struct TaskerConfig {
    /// File the settings were read from, if any
    pub path: Option<PathBuf>,
    pub toml: TaskerToml,
    pub cli: CliOverrides,
}

impl TaskerConfig {
    /// Load from `explicit`, or search from `dir` when no path is given.
    ///
    /// An explicit path must exist.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(dir),
        };
        let toml = match path {
            Some(ref path) => TaskerToml::load(path)?,
            None => TaskerToml::default(),
        };
        Ok(Self {
            path,
            toml,
            cli: CliOverrides::default(),
        })
    }

    pub fn with_cli_args(mut self, cli: CliOverrides) -> Self {
        self.cli = cli;
        self
    }

    /// API base URL (CLI → env → file).
    pub fn base_url(&self) -> String {
        self.cli
            .api_url
            .clone()
            .or_else(|| env_non_empty(ENV_API_URL))
            .unwrap_or_else(|| self.toml.server.base_url.clone())
    }

    /// Bearer token (CLI → env → file).
    pub fn token(&self) -> Option<String> {
        self.cli
            .token
            .clone()
            .or_else(|| env_non_empty(ENV_TOKEN))
            .or_else(|| self.toml.server.token.clone())
    }

    /// Project to open when none is named (env → file).
    pub fn default_project(&self) -> Option<i64> {
        env_non_empty(ENV_PROJECT)
            .and_then(|v| v.parse().ok())
            .or(self.toml.board.default_project)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.toml.server.timeout_secs)
    }

    pub fn activation_distance(&self) -> f64 {
        self.toml.board.activation_distance
    }

    /// Human-readable problems with the effective settings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let base_url = self.base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            warnings.push(format!(
                "Invalid base_url '{}': should start with http:// or https://",
                base_url
            ));
        }
        if self.toml.board.activation_distance <= 0.0 {
            warnings.push(format!(
                "Invalid activation_distance {}: must be positive",
                self.toml.board.activation_distance
            ));
        }
        if self.toml.server.timeout_secs == 0 {
            warnings.push("Invalid timeout_secs 0: every request would time out".to_string());
        }
        if let Ok(raw) = std::env::var(ENV_PROJECT)
            && !raw.is_empty()
            && raw.parse::<i64>().is_err()
        {
            warnings.push(format!("{} is not a project id: '{}'", ENV_PROJECT, raw));
        }

        warnings
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
