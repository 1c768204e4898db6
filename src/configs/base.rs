use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Loads `config.toml`, then `config.default.toml`, falling back to the
    /// built-in defaults when neither exists. Returns the path actually used.
    pub fn load() -> AnyResult<(Self, Option<&'static str>)> {
        for candidate in ["config.toml", "config.default.toml"] {
            if Path::new(candidate).exists() {
                return Ok((Self::from_file(candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    pub fn from_file(path: &str) -> AnyResult<Self> {
        let config_str = std::fs::read_to_string(path)?;
        if config_str.trim().is_empty() {
            return Err(format!("{} is empty", path).into());
        }
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> AnyResult<Self> {
        Ok(toml::from_str(config_str)?)
    }
}
