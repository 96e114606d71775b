// src/gps/simulate.rs
//! Simulated fix generator for running without GPS hardware

use super::data::FixData;

/// Meters per degree of latitude on the WGS84 ellipsoid, near enough for
/// a synthetic walk
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Generates a constant-speed walk heading due east from a start
/// coordinate. Stepped once per delivery interval by the provider loop.
#[derive(Debug, Clone)]
pub struct SimulatedWalk {
    latitude: f64,
    longitude: f64,
    speed_mps: f64,
}

impl SimulatedWalk {
    pub fn new(latitude: f64, longitude: f64, speed_mps: f64) -> Self {
        Self {
            latitude,
            longitude,
            speed_mps: speed_mps.max(0.0),
        }
    }

    /// Walking pace from the default start position
    pub fn default_walk(speed_mps: f64) -> Self {
        Self::new(48.117, 11.517, speed_mps)
    }

    /// Advance the walk by `dt_ms` milliseconds and write the new position
    /// into the fix buffer
    pub fn step(&mut self, dt_ms: u64, data: &mut FixData) {
        let meters = self.speed_mps * dt_ms as f64 / 1000.0;
        let lon_degrees = meters / (METERS_PER_DEGREE * self.latitude.to_radians().cos());
        self.longitude += lon_degrees;

        data.latitude = Some(self.latitude);
        data.longitude = Some(self.longitude);
        data.speed_mps = Some(self.speed_mps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::haversine_distance;

    #[test]
    fn test_step_moves_east_at_speed() {
        let mut walk = SimulatedWalk::new(0.0, 0.0, 10.0);
        let mut data = FixData::new();

        walk.step(1000, &mut data);
        let start = (data.latitude.unwrap(), data.longitude.unwrap());
        walk.step(1000, &mut data);
        let end = (data.latitude.unwrap(), data.longitude.unwrap());

        // 10 m/s over 1 s step
        let d = haversine_distance(start.0, start.1, end.0, end.1);
        assert!((d - 10.0).abs() < 0.1);
        assert_eq!(data.speed_mps, Some(10.0));
    }

    #[test]
    fn test_zero_speed_stays_put() {
        let mut walk = SimulatedWalk::new(48.117, 11.517, 0.0);
        let mut data = FixData::new();

        walk.step(1000, &mut data);
        assert_eq!(data.latitude, Some(48.117));
        assert_eq!(data.longitude, Some(11.517));
    }
}
