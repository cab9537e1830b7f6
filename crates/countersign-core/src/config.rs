use crate::clock::SystemToday;
use crate::errors::{ConfigError, TrackResult};
use crate::storage::Store;
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Host-side settings for the tracking module.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    pub version: u32,
    /// SQLite database path; in-memory when absent.
    #[serde(default)]
    pub database: Option<PathBuf>,
    /// UTC offset (e.g. "-06:00") used when defaulting effective dates.
    /// Unset means the system calendar date.
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl TrackingConfig {
    pub fn utc_offset(&self) -> Result<Option<FixedOffset>, ConfigError> {
        match &self.time_zone {
            None => Ok(None),
            Some(raw) => raw
                .parse::<FixedOffset>()
                .map(Some)
                .map_err(|e| ConfigError(format!("invalid time_zone {:?}: {}", raw, e))),
        }
    }

    /// "Today" provider honoring the configured zone.
    pub fn today_provider(&self) -> Result<SystemToday, ConfigError> {
        Ok(match self.utc_offset()? {
            Some(offset) => SystemToday::with_offset(offset),
            None => SystemToday::new(),
        })
    }

    pub fn open_store(&self) -> TrackResult<Store> {
        match &self.database {
            Some(path) => Store::open(path),
            None => Store::memory(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<TrackingConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<TrackingConfig, ConfigError> {
    let cfg: TrackingConfig =
        serde_yaml::from_str(raw).map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    Ok(cfg)
}
