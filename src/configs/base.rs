use serde::{Deserialize, Serialize};

use crate::common::types::AnyResult;
use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub clients: ClientsConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Reads `config.toml`, then `config.default.toml`. Missing files yield
    /// the built-in defaults.
    pub fn load() -> AnyResult<Self> {
        let config_path = if std::path::Path::new("config.toml").exists() {
            "config.toml"
        } else if std::path::Path::new("config.default.toml").exists() {
            "config.default.toml"
        } else {
            return Ok(Self::default());
        };

        Self::load_from(config_path)
    }

    pub fn load_from(path: &str) -> AnyResult<Self> {
        let config_str = std::fs::read_to_string(path)?;
        Self::parse(&config_str).map_err(|e| format!("{}: {}", path, e).into())
    }

    pub fn parse(config_str: &str) -> AnyResult<Self> {
        Ok(toml::from_str(config_str)?)
    }
}
