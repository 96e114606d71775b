// src/gps/data.rs
//! Partial fix buffer shared by the location providers

use crate::track::LocationFix;
use chrono::{DateTime, Utc};

/// Accumulates fields from provider messages until a complete position is
/// available. NMEA spreads position and speed across sentences, gpsd TPV
/// reports may omit fields, so each provider fills what it has and the
/// monitor promotes the buffer to a [`LocationFix`] once lat/lon are known.
#[derive(Debug, Clone, Default)]
pub struct FixData {
    pub timestamp: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed_mps: Option<f64>,
    pub source: Option<String>,
}

impl FixData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a valid position has been reported
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Update the wall-clock timestamp to now
    pub fn update_timestamp(&mut self) {
        self.timestamp = Some(Utc::now());
    }

    /// Set the data source
    pub fn set_source(&mut self, source: &str) {
        self.source = Some(source.to_string());
    }

    /// Promote the buffer to a complete fix, stamped with the caller's
    /// monotonic clock. Speed defaults to 0 when the provider has not
    /// reported one yet.
    pub fn to_fix(&self, timestamp_ms: u64) -> Option<LocationFix> {
        Some(LocationFix {
            latitude: self.latitude?,
            longitude: self.longitude?,
            speed_mps: self.speed_mps.unwrap_or(0.0).max(0.0),
            timestamp_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_buffer_yields_no_fix() {
        let mut data = FixData::new();
        assert!(data.to_fix(0).is_none());

        data.latitude = Some(48.117);
        assert!(!data.has_position());
        assert!(data.to_fix(0).is_none());
    }

    #[test]
    fn test_complete_buffer_promotes() {
        let mut data = FixData::new();
        data.latitude = Some(48.117);
        data.longitude = Some(11.517);

        let fix = data.to_fix(1500).unwrap();
        assert_eq!(fix.latitude, 48.117);
        assert_eq!(fix.longitude, 11.517);
        assert_eq!(fix.speed_mps, 0.0);
        assert_eq!(fix.timestamp_ms, 1500);
    }

    #[test]
    fn test_negative_speed_clamped() {
        let mut data = FixData::new();
        data.latitude = Some(0.0);
        data.longitude = Some(0.0);
        data.speed_mps = Some(-0.5);

        assert_eq!(data.to_fix(0).unwrap().speed_mps, 0.0);
    }
}
