use crate::constants::{GEOCODE_DELAY_MS, MIN_REFRESH_SECS};
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub board: BoardConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize)]
pub struct BoardConfig {
    pub base_url: String,
    pub board_id: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_geocode_delay")]
    pub delay_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_root")]
    pub data_root: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocode_delay() -> u64 {
    GEOCODE_DELAY_MS
}

fn default_refresh_interval() -> u64 {
    60
}

fn default_data_root() -> String {
    "data".to_string()
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            delay_ms: default_geocode_delay(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            EngineError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path, e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }

    /// Refresh interval with the floor applied; the configured value is a
    /// request, not a promise.
    pub fn effective_refresh_secs(&self) -> u64 {
        self.refresh.interval_secs.max(MIN_REFRESH_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_floor_is_enforced() {
        let config: Config = toml::from_str(
            r#"
            [board]
            base_url = "https://api.example.com/1"
            board_id = "b1"

            [refresh]
            interval_secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.effective_refresh_secs(), MIN_REFRESH_SECS);
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [board]
            base_url = "https://api.example.com/1"
            board_id = "b1"
            "#,
        )
        .unwrap();
        assert_eq!(config.geocoder.delay_ms, GEOCODE_DELAY_MS);
        assert_eq!(config.storage.data_root, "data");
    }
}
