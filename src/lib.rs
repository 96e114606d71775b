// src/lib.rs
//! GPS Distance Tracker Library
//!
//! Accumulates traveled distance, instantaneous speed and elapsed time over
//! a stream of location fixes from serial NMEA, gpsd or a simulated source,
//! with reverse-geocoded display of the current position.

pub mod track;
pub mod gps;
pub mod geocode;
pub mod display;
pub mod monitor;
pub mod config;
pub mod error;

// Re-export main types for convenience
pub use track::{DistanceDelta, LocationFix, TrackSnapshot, TrackState};
pub use monitor::{FixSource, TrackMonitor};
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
