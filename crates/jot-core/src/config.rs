use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of `config.toml`. Every field has a default, so an absent file
/// and an empty file behave the same.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. `None` means [`default_database_path`].
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_handle")]
    pub handle: String,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub write_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub retry_on_connection_failure: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            handle: default_handle(),
            connect_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
            write_timeout_secs: default_timeout_secs(),
            retry_on_connection_failure: default_true(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProfileConfig {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    #[must_use]
    pub const fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

impl AppConfig {
    /// The database file this configuration points at.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// `<data_dir>/jot/jot.sqlite3`, or `./jot.sqlite3` when the platform has no
/// data directory.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("jot.sqlite3"),
        |dir| dir.join("jot").join("jot.sqlite3"),
    )
}

/// `<config_dir>/jot/config.toml`, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jot").join("config.toml"))
}

/// Load a config file. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<AppConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective configuration.
///
/// Precedence: an explicit `config_path`, then the per-user config file,
/// then defaults. `db_override` replaces `store.path` last.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn resolve_config(config_path: Option<&Path>, db_override: Option<&Path>) -> Result<AppConfig> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => match default_config_path() {
            Some(path) => load_config(&path)?,
            None => AppConfig::default(),
        },
    };

    if let Some(db) = db_override {
        config.store.path = Some(db.to_path_buf());
    }

    Ok(config)
}

const fn default_true() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    15
}

fn default_base_url() -> String {
    "https://api.github.com/".to_string()
}

fn default_handle() -> String {
    "octocat".to_string()
}

fn default_user_agent() -> String {
    format!("jot/{}", env!("CARGO_PKG_VERSION"))
}
