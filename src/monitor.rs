// src/monitor.rs v2
/// Tracking session coordination: providers in, accumulator updates out

use crate::{
    error::{Result, TrackerError},
    geocode::{self, ReverseGeocoder},
    gps::{data::FixData, gpsd, nmea, simulate::SimulatedWalk},
    track::{TrackSnapshot, TrackState},
};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, RwLock,
    },
    time::{Duration, Instant},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::SerialPortBuilderExt;

/// Minimum spacing between reverse-geocode lookups (Nominatim policy)
const GEOCODE_INTERVAL: Duration = Duration::from_secs(2);

/// Location source configuration
#[derive(Debug, Clone)]
pub enum FixSource {
    Serial { port: String, baudrate: u32 },
    Gpsd { host: String, port: u16 },
    Simulated { speed_mps: f64 },
}

/// Coordinates one tracking session: subscribes a location provider,
/// serializes fixes into the [`TrackState`] accumulator, and keeps the
/// last resolved address for display.
///
/// Start is idempotent with respect to the provider subscription: the
/// reader task is spawned once, repeated starts only re-arm the session
/// clock. Stop gates delivery without tearing the connection down.
pub struct TrackMonitor {
    state: Arc<Mutex<TrackState>>,
    address: Arc<RwLock<Option<String>>>,
    status: Arc<RwLock<Option<String>>>,
    running: Arc<AtomicBool>,
    tracking: Arc<AtomicBool>,
    subscribed: Arc<AtomicBool>,
    epoch: Instant,
    min_fix_interval: Duration,
    source: FixSource,
    geocoder: Option<Arc<ReverseGeocoder>>,
}

impl TrackMonitor {
    pub fn new(source: FixSource, min_fix_interval_ms: u64, geocoder: Option<ReverseGeocoder>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackState::new())),
            address: Arc::new(RwLock::new(None)),
            status: Arc::new(RwLock::new(None)),
            running: Arc::new(AtomicBool::new(true)),
            tracking: Arc::new(AtomicBool::new(false)),
            subscribed: Arc::new(AtomicBool::new(false)),
            epoch: Instant::now(),
            min_fix_interval: Duration::from_millis(min_fix_interval_ms),
            source,
            geocoder: geocoder.map(Arc::new),
        }
    }

    /// Clone the monitor (shares state, flags and address)
    pub fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            address: Arc::clone(&self.address),
            status: Arc::clone(&self.status),
            running: Arc::clone(&self.running),
            tracking: Arc::clone(&self.tracking),
            subscribed: Arc::clone(&self.subscribed),
            epoch: self.epoch,
            min_fix_interval: self.min_fix_interval,
            source: self.source.clone(),
            geocoder: self.geocoder.clone(),
        }
    }

    /// Milliseconds since the monitor was created; the monotonic clock
    /// every accumulator call is stamped with
    pub fn monotonic_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Begin tracking. Re-arms the session clock when already tracking,
    /// but never subscribes the provider twice.
    pub async fn start_tracking(&self) -> Result<()> {
        let now = self.monotonic_ms();
        self.state.lock().unwrap().start(now);
        self.tracking.store(true, Ordering::Relaxed);

        if !self.subscribed.swap(true, Ordering::SeqCst) {
            if let Err(e) = self.subscribe().await {
                self.subscribed.store(false, Ordering::SeqCst);
                self.tracking.store(false, Ordering::Relaxed);
                self.state.lock().unwrap().stop(self.monotonic_ms());
                return Err(e);
            }
        }

        Ok(())
    }

    /// Stop tracking: folds the open interval into the elapsed total and
    /// gates further fix delivery
    pub fn stop_tracking(&self) {
        let now = self.monotonic_ms();
        self.state.lock().unwrap().stop(now);
        self.tracking.store(false, Ordering::Relaxed);
    }

    /// Toggle between tracking and stopped; returns true when now tracking
    pub async fn toggle_tracking(&self) -> Result<bool> {
        if self.is_tracking() {
            self.stop_tracking();
            Ok(false)
        } else {
            self.start_tracking().await?;
            Ok(true)
        }
    }

    /// Zero distance, fix count and elapsed time. An active session keeps
    /// tracking with fresh counters.
    pub fn reset(&self) {
        self.state.lock().unwrap().reset();
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the monitor and all provider loops
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Current display snapshot
    pub fn snapshot(&self) -> TrackSnapshot {
        let now = self.monotonic_ms();
        self.state.lock().unwrap().snapshot(now)
    }

    /// Last resolved address, or the coordinate fallback
    pub fn address(&self) -> Option<String> {
        self.address.read().unwrap().clone()
    }

    /// Drain the latest provider status message, if any. Provider loops
    /// report errors here rather than writing to the terminal the display
    /// owns.
    pub fn take_status(&self) -> Option<String> {
        self.status.write().unwrap().take()
    }

    fn report_status(&self, message: String) {
        *self.status.write().unwrap() = Some(message);
    }

    /// Connect the configured source and spawn its reader loop
    async fn subscribe(&self) -> Result<()> {
        match self.source.clone() {
            FixSource::Serial { port, baudrate } => self.subscribe_serial(&port, baudrate).await,
            FixSource::Gpsd { host, port } => self.subscribe_gpsd(&host, port).await,
            FixSource::Simulated { speed_mps } => {
                self.subscribe_simulated(speed_mps);
                Ok(())
            }
        }
    }

    async fn subscribe_serial(&self, port: &str, baudrate: u32) -> Result<()> {
        let serial = tokio_serial::new(port, baudrate)
            .timeout(Duration::from_millis(1000))
            .open_native_async()
            .map_err(|e| TrackerError::Connection(format!("Failed to open serial port {}: {}", port, e)))?;

        let monitor = self.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(serial);
            let mut line = String::new();
            let mut buffer = FixData::new();
            buffer.set_source("Serial GPS");
            let mut gate = DeliveryGate::new(monitor.min_fix_interval);

            while monitor.is_running() {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let line = line.trim();
                        if !line.is_empty() {
                            buffer.update_timestamp();
                            nmea::parse_nmea_sentence(&mut buffer, line);
                            monitor.try_deliver(&buffer, &mut gate);
                        }
                    }
                    Err(e) => {
                        monitor.report_status(format!("Serial read error: {}", e));
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn subscribe_gpsd(&self, host: &str, port: u16) -> Result<()> {
        let mut reader = gpsd::connect_gpsd(host, port).await?;

        let monitor = self.clone();
        tokio::spawn(async move {
            let mut line = String::new();
            let mut buffer = FixData::new();
            buffer.set_source("gpsd");
            let mut gate = DeliveryGate::new(monitor.min_fix_interval);

            while monitor.is_running() {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let line = line.trim();
                        if !line.is_empty() {
                            buffer.update_timestamp();
                            if let Err(e) = gpsd::parse_gpsd_json(&mut buffer, line) {
                                monitor.report_status(format!("gpsd parse error: {}", e));
                            } else {
                                monitor.try_deliver(&buffer, &mut gate);
                            }
                        }
                    }
                    Err(e) => {
                        monitor.report_status(format!("gpsd read error: {}", e));
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    fn subscribe_simulated(&self, speed_mps: f64) {
        let monitor = self.clone();
        tokio::spawn(async move {
            let mut walk = SimulatedWalk::default_walk(speed_mps);
            let mut buffer = FixData::new();
            buffer.set_source("Simulated");
            let mut gate = DeliveryGate::new(monitor.min_fix_interval);
            let step = monitor.min_fix_interval.max(Duration::from_millis(1000));

            while monitor.is_running() {
                tokio::time::sleep(step).await;
                if monitor.is_tracking() {
                    buffer.update_timestamp();
                    walk.step(step.as_millis() as u64, &mut buffer);
                    monitor.try_deliver(&buffer, &mut gate);
                }
            }
        });
    }

    /// Hand a complete, interval-throttled fix to the accumulator and kick
    /// off the address lookup for it
    fn try_deliver(&self, buffer: &FixData, gate: &mut DeliveryGate) {
        if !self.is_tracking() || !buffer.has_position() {
            return;
        }
        if !gate.fix_due() {
            return;
        }

        let fix = match buffer.to_fix(self.monotonic_ms()) {
            Some(fix) => fix,
            None => return,
        };

        let accepted = self.state.lock().unwrap().record_fix(fix).is_some();
        if accepted {
            self.update_address(fix.latitude, fix.longitude, gate);
        }
    }

    /// Resolve the fix position to an address in the background; any
    /// lookup failure falls back to raw coordinates
    fn update_address(&self, latitude: f64, longitude: f64, gate: &mut DeliveryGate) {
        let geocoder = match &self.geocoder {
            Some(g) if gate.geocode_due() => Arc::clone(g),
            Some(_) => return, // keep the previous address until the next lookup window
            None => {
                *self.address.write().unwrap() = Some(geocode::format_coordinates(latitude, longitude));
                return;
            }
        };

        let address = Arc::clone(&self.address);
        tokio::spawn(async move {
            let resolved = match geocoder.lookup(latitude, longitude).await {
                Ok(Some(addr)) => addr,
                Ok(None) | Err(_) => geocode::format_coordinates(latitude, longitude),
            };
            *address.write().unwrap() = Some(resolved);
        });
    }
}

/// Per-loop throttle state: at most one accepted fix per interval and one
/// geocode lookup per [`GEOCODE_INTERVAL`]
struct DeliveryGate {
    min_fix_interval: Duration,
    last_fix: Option<Instant>,
    last_geocode: Option<Instant>,
}

impl DeliveryGate {
    fn new(min_fix_interval: Duration) -> Self {
        Self {
            min_fix_interval,
            last_fix: None,
            last_geocode: None,
        }
    }

    fn fix_due(&mut self) -> bool {
        let now = Instant::now();
        match self.last_fix {
            Some(last) if now.duration_since(last) < self.min_fix_interval => false,
            _ => {
                self.last_fix = Some(now);
                true
            }
        }
    }

    fn geocode_due(&mut self) -> bool {
        let now = Instant::now();
        match self.last_geocode {
            Some(last) if now.duration_since(last) < GEOCODE_INTERVAL => false,
            _ => {
                self.last_geocode = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulated_monitor() -> TrackMonitor {
        TrackMonitor::new(FixSource::Simulated { speed_mps: 5.0 }, 1000, None)
    }

    #[tokio::test]
    async fn test_start_stop_toggles_state() {
        let monitor = simulated_monitor();
        assert!(!monitor.is_tracking());

        monitor.start_tracking().await.unwrap();
        assert!(monitor.is_tracking());

        monitor.stop_tracking();
        assert!(!monitor.is_tracking());

        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_double_start_subscribes_once() {
        let monitor = simulated_monitor();
        monitor.start_tracking().await.unwrap();
        monitor.start_tracking().await.unwrap();

        assert!(monitor.subscribed.load(Ordering::SeqCst));
        assert!(monitor.is_tracking());
        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_reset_preserves_tracking() {
        let monitor = simulated_monitor();
        monitor.start_tracking().await.unwrap();
        monitor.reset();

        assert!(monitor.is_tracking());
        let snap = monitor.snapshot();
        assert_eq!(snap.distance_km, 0.0);
        assert_eq!(snap.fix_count, 0);
        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_delivery_gated_while_stopped() {
        let monitor = simulated_monitor();
        let mut buffer = FixData::new();
        buffer.latitude = Some(48.117);
        buffer.longitude = Some(11.517);
        let mut gate = DeliveryGate::new(Duration::from_millis(0));

        // not tracking: the fix must not reach the accumulator
        monitor.try_deliver(&buffer, &mut gate);
        assert_eq!(monitor.snapshot().fix_count, 0);

        monitor.start_tracking().await.unwrap();
        monitor.try_deliver(&buffer, &mut gate);
        assert_eq!(monitor.snapshot().fix_count, 1);
        monitor.shutdown();
    }

    #[tokio::test]
    async fn test_coordinate_fallback_without_geocoder() {
        let monitor = simulated_monitor();
        monitor.start_tracking().await.unwrap();

        let mut buffer = FixData::new();
        buffer.latitude = Some(48.117);
        buffer.longitude = Some(11.517);
        let mut gate = DeliveryGate::new(Duration::from_millis(0));
        monitor.try_deliver(&buffer, &mut gate);

        assert_eq!(monitor.address(), Some("48.117000, 11.517000".to_string()));
        monitor.shutdown();
    }

    #[test]
    fn test_status_drained_once() {
        let monitor = simulated_monitor();
        assert_eq!(monitor.take_status(), None);

        monitor.report_status("gpsd read error: connection reset".to_string());

        // a shared clone sees the message, and draining clears it
        let shared = monitor.clone();
        assert_eq!(
            shared.take_status(),
            Some("gpsd read error: connection reset".to_string())
        );
        assert_eq!(monitor.take_status(), None);
    }

    #[test]
    fn test_fix_gate_throttles() {
        let mut gate = DeliveryGate::new(Duration::from_secs(60));
        assert!(gate.fix_due());
        assert!(!gate.fix_due());
    }
}
