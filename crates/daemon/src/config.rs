// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file

use kiln_core::Selector;
use kiln_engine::ControllerConfig;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no build strategies configured")]
    NoStrategies,

    #[error("tick_period must be greater than zero")]
    ZeroTickPeriod,

    #[error("strategies.{0}.builder_image must not be empty")]
    EmptyBuilderImage(&'static str),
}

/// Top-level `kilnd` configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding one JSON record per build
    pub registry_dir: PathBuf,
    /// Log file; stderr when absent
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(with = "humantime_serde", default)]
    pub tick_period: Option<Duration>,
    /// Running builds older than this are failed
    #[serde(with = "humantime_serde", default)]
    pub build_timeout: Option<Duration>,
    /// Label selector such as `team=web,tier=ci`
    #[serde(default, deserialize_with = "deserialize_selector")]
    pub selector: Selector,
    #[serde(default)]
    pub strategies: StrategiesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategiesConfig {
    pub docker: Option<DockerConfig>,
    pub sti: Option<StiConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DockerConfig {
    pub builder_image: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StiConfig {
    pub builder_image: String,
    /// Parent of the per-build scratch directories; system temp dir when absent
    #[serde(default)]
    pub scratch_root: Option<PathBuf>,
}

fn deserialize_selector<'de, D>(deserializer: D) -> Result<Selector, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse::<Selector>().map_err(serde::de::Error::custom)
}

impl Config {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate config text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.docker.is_none() && self.strategies.sti.is_none() {
            return Err(ConfigError::NoStrategies);
        }
        if self.tick_period == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if let Some(docker) = &self.strategies.docker {
            if docker.builder_image.trim().is_empty() {
                return Err(ConfigError::EmptyBuilderImage("docker"));
            }
        }
        if let Some(sti) = &self.strategies.sti {
            if sti.builder_image.trim().is_empty() {
                return Err(ConfigError::EmptyBuilderImage("sti"));
            }
        }
        Ok(())
    }

    /// Controller settings, with defaults filled in
    pub fn controller_config(&self) -> ControllerConfig {
        let defaults = ControllerConfig::default();
        ControllerConfig {
            tick_period: self.tick_period.unwrap_or(defaults.tick_period),
            build_timeout: self.build_timeout.unwrap_or(defaults.build_timeout),
            selector: self.selector.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
