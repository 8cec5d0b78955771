//! Configuration file support for NutriLog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/nutrilog/config.toml`,
//! or from the path in `NUTRILOG_CONFIG` when set.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "NUTRILOG_CONFIG";

/// Application configuration
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Extraction service configuration
#[derive(Clone, Debug, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Statistics display configuration
#[derive(Clone, Debug, Deserialize)]
pub struct StatsConfig {
    /// Window (in distinct dates) used when none is given
    #[serde(default = "default_window")]
    pub default_window: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            default_window: default_window(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir().join(".local/share"));
    base.join("nutrilog")
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_window() -> usize {
    7
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the config file path, honouring `NUTRILOG_CONFIG`
    pub fn default_config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let base = dirs::config_dir().unwrap_or_else(|| home_dir().join(".config"));
        base.join("nutrilog").join("config.toml")
    }

    fn validate(&self) -> Result<()> {
        if self.stats.default_window == 0 {
            return Err(Error::Config("stats.default_window must be positive".into()));
        }
        if self.extraction.timeout_secs == 0 {
            return Err(Error::Config("extraction.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
