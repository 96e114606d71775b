// src/gps/mod.rs
//! Location providers and fix parsing

pub mod data;
pub mod nmea;
pub mod gpsd;
pub mod simulate;

pub use data::FixData;
