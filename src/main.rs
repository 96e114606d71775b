// src/main.rs v3
//! GPS Distance Tracker - terminal trip recorder

use clap::Parser;
use gps_distance_tracker::{
    config::TrackerConfig,
    display::TerminalDisplay,
    error::{Result, TrackerError},
    geocode::ReverseGeocoder,
    monitor::{FixSource, TrackMonitor},
};

#[derive(Parser, Debug)]
#[command(name = "gps-distance-tracker", version, about = "Track traveled distance, speed and elapsed time from a GPS source")]
struct Args {
    /// Location source: serial, gpsd or simulate
    #[arg(long)]
    source: Option<String>,

    /// Serial device path (serial source)
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// gpsd host
    #[arg(long)]
    host: Option<String>,

    /// gpsd TCP port
    #[arg(long)]
    gpsd_port: Option<u16>,

    /// Simulated walk speed in m/s
    #[arg(long)]
    speed: Option<f64>,

    /// Disable reverse geocoding (show raw coordinates)
    #[arg(long)]
    no_geocode: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TrackerConfig::load().unwrap_or_default();
    apply_overrides(&mut config, &args);

    if args.save_config {
        config.save()?;
    }

    let source = build_source(&config)?;
    let geocoder = if config.geocode {
        Some(ReverseGeocoder::new()?)
    } else {
        None
    };

    println!("Starting GPS Distance Tracker...");
    println!("Using {} source", config.source_type);

    let monitor = TrackMonitor::new(source, config.min_fix_interval_ms, geocoder);
    TerminalDisplay::new().run(monitor).await
}

fn apply_overrides(config: &mut TrackerConfig, args: &Args) {
    if let Some(ref source) = args.source {
        config.source_type = source.clone();
    }
    if let Some(ref port) = args.port {
        config.serial_port = Some(port.clone());
        config.source_type = "serial".to_string();
    }
    if let Some(baud) = args.baud {
        config.serial_baudrate = Some(baud);
    }
    if let Some(ref host) = args.host {
        config.gpsd_host = Some(host.clone());
    }
    if let Some(port) = args.gpsd_port {
        config.gpsd_port = Some(port);
    }
    if let Some(speed) = args.speed {
        config.simulated_speed_mps = speed;
    }
    if args.no_geocode {
        config.geocode = false;
    }
}

fn build_source(config: &TrackerConfig) -> Result<FixSource> {
    match config.source_type.as_str() {
        "serial" => {
            let port = config
                .serial_port
                .clone()
                .ok_or_else(|| TrackerError::Other("Serial source requires --port".to_string()))?;
            Ok(FixSource::Serial {
                port,
                baudrate: config.serial_baudrate.unwrap_or(9600),
            })
        }
        "gpsd" => Ok(FixSource::Gpsd {
            host: config.gpsd_host.clone().unwrap_or_else(|| "localhost".to_string()),
            port: config.gpsd_port.unwrap_or(2947),
        }),
        "simulate" => Ok(FixSource::Simulated {
            speed_mps: config.simulated_speed_mps,
        }),
        other => Err(TrackerError::Other(format!("Unknown source type: {}", other))),
    }
}
