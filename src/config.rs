// ⚙️ Configuration - TOML file + environment overrides
//
// Lookup order: $AURUM_CONFIG, then <config_dir>/aurum/config.toml, then
// built-in defaults. AURUM_DB, AURUM_LOG and AURUM_ADDR override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rate::DEFAULT_RATE;

pub const CONFIG_ENV: &str = "AURUM_CONFIG";
pub const DB_ENV: &str = "AURUM_DB";
pub const LOG_ENV: &str = "AURUM_LOG";
pub const ADDR_ENV: &str = "AURUM_ADDR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file holding the rate, ledger and audit trail
    pub database_path: PathBuf,

    /// Rate used before the user sets one (per tola of 24K)
    pub default_rate: f64,

    /// Prefix for currency amounts
    pub currency_symbol: String,

    /// Bind address for aurum-server
    pub server_addr: String,

    /// tracing filter directive, e.g. "info" or "aurum_calc=debug"
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: default_database_path(),
            default_rate: DEFAULT_RATE,
            currency_symbol: "Rs".to_string(),
            server_addr: "127.0.0.1:3000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Resolve the config file, read it if present, then apply env overrides
    pub fn load() -> Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let mut config = match explicit {
            Some(path) => Config::from_file(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Config::from_file(&path)?,
                _ => Config::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Config::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if !config.default_rate.is_finite() || config.default_rate <= 0.0 {
            anyhow::bail!("default_rate must be positive, got {}", config.default_rate);
        }
        Ok(config)
    }

    /// Apply overrides from a variable lookup (std::env in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(DB_ENV).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(level) = lookup(LOG_ENV).filter(|v| !v.is_empty()) {
            self.log_level = level;
        }
        if let Some(addr) = lookup(ADDR_ENV).filter(|v| !v.is_empty()) {
            self.server_addr = addr;
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("aurum").join("config.toml"))
}

pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aurum")
        .join("aurum.db")
}
