// src/track.rs v1
//! Distance and elapsed-time accumulation over a stream of location fixes

/// Mean Earth radius in meters, matches typical GPS receiver semantics
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// One reported position sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Speed over ground in m/s, >= 0; 0 when stationary or unsupported
    pub speed_mps: f64,
    /// Monotonic clock reading in milliseconds, non-decreasing within a session
    pub timestamp_ms: u64,
}

/// Result of accepting one fix: the distance increment and the fix's speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceDelta {
    pub meters: f64,
    pub speed_mps: f64,
}

/// Read-only view of the accumulated session, for display
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSnapshot {
    pub distance_km: f64,
    /// None until a fix has been accepted
    pub speed_kmh: Option<f64>,
    pub fix_count: u64,
    pub elapsed_ms: u64,
    pub last_fix: Option<LocationFix>,
}

/// Session state for one tracking run.
///
/// All operations take an explicit monotonic `now_ms` so the accumulator
/// carries no clock of its own; the caller supplies monotonic milliseconds
/// (e.g. from an `Instant` epoch). Operations must be serialized by the
/// caller, none of them block.
#[derive(Debug, Clone, Default)]
pub struct TrackState {
    is_tracking: bool,
    total_distance_m: f64,
    last_fix: Option<LocationFix>,
    fix_count: u64,
    /// Active milliseconds carried over from earlier start/stop cycles
    accumulated_elapsed_ms: u64,
    /// Valid only while tracking
    session_start_ms: u64,
}

impl TrackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or re-arm) a tracking session.
    ///
    /// Calling this while already tracking restarts the session clock
    /// without touching the accumulated totals.
    pub fn start(&mut self, now_ms: u64) {
        self.is_tracking = true;
        self.session_start_ms = now_ms;
    }

    /// Stop tracking, folding the current session interval into the
    /// accumulated elapsed time. No-op when already stopped.
    pub fn stop(&mut self, now_ms: u64) {
        if self.is_tracking {
            self.accumulated_elapsed_ms += now_ms.saturating_sub(self.session_start_ms);
            self.is_tracking = false;
        }
    }

    /// Zero the distance, fix count and elapsed time. Tracking state is
    /// untouched: resetting mid-session keeps fixes coming, with the next
    /// fix starting the distance reference from scratch.
    pub fn reset(&mut self) {
        self.total_distance_m = 0.0;
        self.fix_count = 0;
        self.last_fix = None;
        self.accumulated_elapsed_ms = 0;
    }

    /// Accept one fix. Returns `None` (and mutates nothing) when not
    /// tracking; otherwise returns the distance increment, which is 0.0
    /// for the first fix since start/reset.
    pub fn record_fix(&mut self, fix: LocationFix) -> Option<DistanceDelta> {
        if !self.is_tracking {
            return None;
        }

        self.fix_count += 1;

        let meters = match self.last_fix {
            Some(last) => {
                let d = haversine_distance(last.latitude, last.longitude, fix.latitude, fix.longitude);
                self.total_distance_m += d;
                d
            }
            None => 0.0,
        };

        self.last_fix = Some(fix);

        Some(DistanceDelta {
            meters,
            speed_mps: fix.speed_mps,
        })
    }

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn total_distance_m(&self) -> f64 {
        self.total_distance_m
    }

    pub fn fix_count(&self) -> u64 {
        self.fix_count
    }

    pub fn last_fix(&self) -> Option<LocationFix> {
        self.last_fix
    }

    /// Active milliseconds: the carried total plus the open interval when
    /// currently tracking
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        if self.is_tracking {
            self.accumulated_elapsed_ms + now_ms.saturating_sub(self.session_start_ms)
        } else {
            self.accumulated_elapsed_ms
        }
    }

    /// Pure read of the display quantities; no mutation
    pub fn snapshot(&self, now_ms: u64) -> TrackSnapshot {
        TrackSnapshot {
            distance_km: self.total_distance_m / 1000.0,
            speed_kmh: self.last_fix.map(|f| f.speed_mps * 3.6),
            fix_count: self.fix_count,
            elapsed_ms: self.elapsed_ms(now_ms),
            last_fix: self.last_fix,
        }
    }
}

/// Great-circle distance in meters between two lat/lon pairs in degrees,
/// haversine formula on a spherical Earth
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Format elapsed milliseconds as HH:MM:SS, truncating to whole seconds
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let seconds = elapsed_ms / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds / 60) % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds % 60)
}
