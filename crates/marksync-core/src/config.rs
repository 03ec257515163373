//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/marksync/config.toml)
//! 3. Environment variables (MARKSYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::AuthContext;
use crate::tier::Tier;

/// Environment variable prefix
const ENV_PREFIX: &str = "MARKSYNC";

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Keys accepted by [`Config::set_value`]
pub const KEYS: &[&str] = &[
    "data_dir",
    "remote_url",
    "sync_enabled",
    "user_id",
    "tier",
    "remote_timeout_secs",
    "sync_interval_secs",
    "log_file",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the bookmark and pending-operation blobs
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Base URL of the bookmark service (optional)
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Whether sync is enabled
    #[serde(default)]
    pub sync_enabled: bool,

    /// Signed-in user; `None` means anonymous
    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub tier: Tier,

    /// Timeout for each remote call
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,

    /// Periodic sync interval for long-running sessions; 0 or unset disables it
    #[serde(default)]
    pub sync_interval_secs: Option<u64>,

    /// Write logs here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            remote_url: None,
            sync_enabled: false,
            user_id: None,
            tier: Tier::default(),
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            sync_interval_secs: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MARKSYNC_DATA_DIR, MARKSYNC_REMOTE_URL, ...)
    /// 2. Config file (~/.config/marksync/config.toml or MARKSYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load from `--config` if given, otherwise the default location
    pub fn load_with_cli_override(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        let var = |name: &str| std::env::var(format!("{}_{}", ENV_PREFIX, name)).ok();

        if let Some(val) = var("DATA_DIR") {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string clears optional values
        if let Some(val) = var("REMOTE_URL") {
            self.remote_url = non_empty(val);
        }

        if let Some(val) = var("SYNC_ENABLED") {
            self.sync_enabled = parse_bool(&val);
        }

        if let Some(val) = var("USER_ID") {
            self.user_id = non_empty(val);
        }

        if let Some(tier) = var("TIER").as_deref().and_then(Tier::parse) {
            self.tier = tier;
        }

        if let Some(secs) = var("REMOTE_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.remote_timeout_secs = secs;
        }

        if let Some(val) = var("SYNC_INTERVAL_SECS") {
            self.sync_interval_secs = val.parse().ok();
        }

        if let Some(val) = var("LOG_FILE") {
            self.log_file = non_empty(val).map(PathBuf::from);
        }
    }

    /// Set a single key from its string form (used by `config set`)
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "remote_url" => self.remote_url = non_empty(value.to_string()),
            "sync_enabled" => self.sync_enabled = parse_bool(value),
            "user_id" => self.user_id = non_empty(value.to_string()),
            "tier" => {
                self.tier = Tier::parse(value)
                    .with_context(|| format!("Unknown tier '{}' (expected free or pro)", value))?
            }
            "remote_timeout_secs" => {
                self.remote_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout: {}", value))?
            }
            "sync_interval_secs" => {
                self.sync_interval_secs = if value.is_empty() {
                    None
                } else {
                    Some(
                        value
                            .parse()
                            .with_context(|| format!("Invalid interval: {}", value))?,
                    )
                }
            }
            "log_file" => self.log_file = non_empty(value.to_string()).map(PathBuf::from),
            _ => bail!(
                "Unknown config key '{}'. Valid keys: {}",
                key,
                KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MARKSYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marksync")
            .join("config.toml")
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    pub fn sync_interval(&self) -> Option<Duration> {
        self.sync_interval_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Auth context derived from `user_id` and `sync_enabled`
    pub fn auth(&self) -> AuthContext {
        match (&self.user_id, self.sync_enabled) {
            (Some(user_id), true) => AuthContext::authenticated(user_id.clone()),
            _ => AuthContext::anonymous(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("marksync")
}

fn default_remote_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}
