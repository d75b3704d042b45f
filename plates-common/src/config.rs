//! Configuration loading
//!
//! Each setting resolves in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing TOML file is not an error: defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BOT_TOKEN: &str = "PLATES_BOT_TOKEN";
pub const ENV_ROOT_FOLDER: &str = "PLATES_ROOT_FOLDER";
pub const ENV_DB_NAME: &str = "PLATES_DB_NAME";
pub const ENV_STORE_TIMEOUT_MS: &str = "PLATES_STORE_TIMEOUT_MS";
pub const ENV_MAX_BUFFERED_PHOTOS: &str = "PLATES_MAX_BUFFERED_PHOTOS";

pub const DEFAULT_DB_NAME: &str = "plates_bot_db";
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_BUFFERED_PHOTOS: usize = 50;

/// Bootstrap configuration loaded from TOML file
///
/// All fields optional; absent fields fall through to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Telegram bot token
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Data directory holding the database file
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Storage namespace; the database file is `<root_folder>/<db_name>.db`
    #[serde(default)]
    pub db_name: Option<String>,

    /// Upper bound on a single store operation
    #[serde(default)]
    pub store_timeout_ms: Option<u64>,

    /// Photos one conversation may buffer before a plate arrives
    #[serde(default)]
    pub max_buffered_photos: Option<usize>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse one TOML file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        Self::from_toml_str(&content)
    }
}

/// Config file to read, if any
///
/// An explicit path that does not exist is an error; a missing default
/// file is not.
pub fn locate_config_file(explicit_path: Option<&Path>) -> Result<Option<PathBuf>> {
    match explicit_path {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(Error::Config(format!("Config file not found: {:?}", path))),
        None => Ok(default_config_file()),
    }
}

/// Overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bot_token: Option<String>,
    pub root_folder: Option<PathBuf>,
    pub db_name: Option<String>,
}

/// Fully resolved bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    pub root_folder: PathBuf,
    pub db_name: String,
    pub store_timeout: Duration,
    pub max_buffered_photos: usize,
    pub log_level: String,
}

impl BotConfig {
    /// Resolve every setting from CLI, environment, TOML and defaults
    pub fn resolve(cli: CliOverrides, toml_config: TomlConfig) -> Result<Self> {
        let bot_token = cli
            .bot_token
            .or_else(|| env_var(ENV_BOT_TOKEN))
            .or(toml_config.bot_token)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Bot token not configured. Use --bot-token, {} or bot_token in config.toml",
                    ENV_BOT_TOKEN
                ))
            })?;

        let root_folder = cli
            .root_folder
            .or_else(|| env_var(ENV_ROOT_FOLDER).map(PathBuf::from))
            .or(toml_config.root_folder)
            .unwrap_or_else(default_root_folder);

        let db_name = cli
            .db_name
            .or_else(|| env_var(ENV_DB_NAME))
            .or(toml_config.db_name)
            .unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        validate_db_name(&db_name)?;

        let store_timeout_ms = match env_var(ENV_STORE_TIMEOUT_MS) {
            Some(value) => parse_env_number::<u64>(ENV_STORE_TIMEOUT_MS, &value)?,
            None => toml_config
                .store_timeout_ms
                .unwrap_or(DEFAULT_STORE_TIMEOUT_MS),
        };
        if store_timeout_ms == 0 {
            return Err(Error::Config(
                "store_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let max_buffered_photos = match env_var(ENV_MAX_BUFFERED_PHOTOS) {
            Some(value) => parse_env_number::<usize>(ENV_MAX_BUFFERED_PHOTOS, &value)?,
            None => toml_config
                .max_buffered_photos
                .unwrap_or(DEFAULT_MAX_BUFFERED_PHOTOS),
        };
        if max_buffered_photos == 0 {
            return Err(Error::Config(
                "max_buffered_photos must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bot_token,
            root_folder,
            db_name,
            store_timeout: Duration::from_millis(store_timeout_ms),
            max_buffered_photos,
            log_level: toml_config.logging.level,
        })
    }

    /// Database file for the configured namespace
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(format!("{}.db", self.db_name))
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_env_number<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| Error::Config(format!("Invalid {} value {:?}: {}", key, value, e)))
}

/// Namespace must be a plain file stem
fn validate_db_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid db_name {:?}: use letters, digits, '_' or '-'",
            name
        )))
    }
}

/// First existing config file for the platform
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("plates").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/plates/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default data folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("plates"))
        .unwrap_or_else(|| PathBuf::from("./plates_data"))
}
