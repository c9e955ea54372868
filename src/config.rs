// src/config.rs
//! Configuration stored as JSON under the user's config directory

use crate::error::{GpsError, Result};
use crate::gps::nmea::DEFAULT_UTC_OFFSET_HOURS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BAUDRATE: u32 = 9600;
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsStatusConfig {
    pub serial_port: Option<String>,
    pub baudrate: u32,
    /// Whole hours added to receiver UTC time
    pub utc_offset_hours: i32,
    pub report_interval_secs: u64,
    pub verify_checksum: bool,
}

impl Default for GpsStatusConfig {
    fn default() -> Self {
        Self {
            serial_port: None,
            baudrate: DEFAULT_BAUDRATE,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
            verify_checksum: false,
        }
    }
}

impl GpsStatusConfig {
    /// Load from the default config file, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Save to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("gps-status").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(GpsError::Config(format!(
                "UTC offset {} is outside -12..=14 hours",
                self.utc_offset_hours
            )));
        }
        if self.report_interval_secs == 0 {
            return Err(GpsError::Config("Report interval must be at least 1 second".to_string()));
        }
        if self.baudrate == 0 {
            return Err(GpsError::Config("Baud rate must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }
}
