// src/config.rs v2
//! Configuration management

use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub source_type: String, // "serial", "gpsd", "simulate"
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    pub gpsd_host: Option<String>,
    pub gpsd_port: Option<u16>,
    /// Minimum spacing between accepted fixes in milliseconds
    pub min_fix_interval_ms: u64,
    /// Resolve fixes to addresses via Nominatim
    pub geocode: bool,
    /// Speed of the simulated walk in m/s
    pub simulated_speed_mps: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            source_type: "gpsd".to_string(),
            serial_port: None,
            serial_baudrate: Some(9600),
            gpsd_host: Some("localhost".to_string()),
            gpsd_port: Some(2947),
            min_fix_interval_ms: 1000,
            geocode: true,
            simulated_speed_mps: 1.5,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from the config file, falling back to defaults
    /// when none exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)
            .map_err(|e| TrackerError::Other(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| TrackerError::Other(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the config file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TrackerError::Other(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TrackerError::Other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| TrackerError::Other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| TrackerError::Other("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gps-distance-tracker")
            .join("config.json"))
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }

    /// Update gpsd settings
    pub fn update_gpsd(&mut self, host: String, port: u16) {
        self.source_type = "gpsd".to_string();
        self.gpsd_host = Some(host);
        self.gpsd_port = Some(port);
    }

    /// Update simulated source settings
    pub fn update_simulated(&mut self, speed_mps: f64) {
        self.source_type = "simulate".to_string();
        self.simulated_speed_mps = speed_mps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.source_type, "gpsd");
        assert_eq!(config.min_fix_interval_ms, 1000);
        assert!(config.geocode);
    }

    #[test]
    fn test_update_serial() {
        let mut config = TrackerConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 115200);
        assert_eq!(config.source_type, "serial");
        assert_eq!(config.serial_port, Some("/dev/ttyUSB0".to_string()));
        assert_eq!(config.serial_baudrate, Some(115200));
    }

    #[test]
    fn test_update_gpsd() {
        let mut config = TrackerConfig::default();
        config.update_gpsd("gps.local".to_string(), 2948);
        assert_eq!(config.source_type, "gpsd");
        assert_eq!(config.gpsd_host, Some("gps.local".to_string()));
        assert_eq!(config.gpsd_port, Some(2948));
    }

    #[test]
    fn test_config_round_trip_json() {
        let mut config = TrackerConfig::default();
        config.update_simulated(3.0);
        config.geocode = false;

        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrackerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.source_type, "simulate");
        assert_eq!(parsed.simulated_speed_mps, 3.0);
        assert!(!parsed.geocode);
    }
}
