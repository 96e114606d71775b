// src/gps/gpsd.rs
//! GPSD client implementation

use super::data::FixData;
use crate::error::{Result, TrackerError};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
};

#[derive(Debug, Deserialize)]
struct GpsdMessage {
    class: String,
    #[serde(flatten)]
    data: HashMap<String, serde_json::Value>,
}

/// Connect to a gpsd daemon and return a stream reader
pub async fn connect_gpsd(host: &str, port: u16) -> Result<BufReader<TcpStream>> {
    let mut stream = TcpStream::connect(format!("{}:{}", host, port))
        .await
        .map_err(|e| TrackerError::Connection(format!("Failed to connect to gpsd at {}:{}: {}", host, port, e)))?;

    // Send WATCH command to start receiving JSON data
    let watch_cmd = "?WATCH={\"enable\":true,\"json\":true}\n";
    stream
        .write_all(watch_cmd.as_bytes())
        .await
        .map_err(|e| TrackerError::Connection(format!("Failed to send WATCH command: {}", e)))?;

    Ok(BufReader::new(stream))
}

/// Parse a single line of gpsd JSON data
pub fn parse_gpsd_json(data: &mut FixData, line: &str) -> Result<()> {
    let msg: GpsdMessage = serde_json::from_str(line)
        .map_err(|e| TrackerError::Parse(format!("Failed to parse gpsd JSON: {}", e)))?;

    if msg.class == "TPV" {
        parse_tpv_message(data, &msg.data);
    }
    // SKY, VERSION, DEVICES and the rest carry nothing the tracker uses

    Ok(())
}

/// Parse TPV (Time Position Velocity) message
fn parse_tpv_message(data: &mut FixData, msg_data: &HashMap<String, serde_json::Value>) {
    if let Some(lat) = msg_data.get("lat").and_then(|v| v.as_f64()) {
        data.latitude = Some(lat);
    }

    if let Some(lon) = msg_data.get("lon").and_then(|v| v.as_f64()) {
        data.longitude = Some(lon);
    }

    // gpsd reports speed in m/s already
    if let Some(speed) = msg_data.get("speed").and_then(|v| v.as_f64()) {
        data.speed_mps = Some(speed);
    }
}
