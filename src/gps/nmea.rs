// src/gps/nmea.rs
//! NMEA sentence parsing for the serial provider

use super::data::FixData;

const KNOTS_TO_MPS: f64 = 0.514444;

/// Parse a single NMEA sentence and update the fix buffer
pub fn parse_nmea_sentence(data: &mut FixData, line: &str) {
    let parts: Vec<&str> = line.split(',').collect();

    if line.starts_with("$GPGGA") || line.starts_with("$GNGGA") {
        parse_gga(data, &parts);
    } else if line.starts_with("$GPRMC") || line.starts_with("$GNRMC") {
        parse_rmc(data, &parts);
    }
}

/// Parse GGA (Global Positioning System Fix Data) sentence
fn parse_gga(data: &mut FixData, parts: &[&str]) {
    if parts.len() < 15 {
        return;
    }

    // Latitude (field 2 and 3)
    if !parts[2].is_empty() && !parts[3].is_empty() {
        if let Ok(lat) = parts[2].parse::<f64>() {
            let lat_deg = (lat / 100.0) as i32;
            let lat_min = lat % 100.0;
            let mut latitude = lat_deg as f64 + lat_min / 60.0;
            if parts[3] == "S" {
                latitude = -latitude;
            }
            data.latitude = Some(latitude);
        }
    }

    // Longitude (field 4 and 5)
    if !parts[4].is_empty() && !parts[5].is_empty() {
        if let Ok(lon) = parts[4].parse::<f64>() {
            let lon_deg = (lon / 100.0) as i32;
            let lon_min = lon % 100.0;
            let mut longitude = lon_deg as f64 + lon_min / 60.0;
            if parts[5] == "W" {
                longitude = -longitude;
            }
            data.longitude = Some(longitude);
        }
    }
}

/// Parse RMC (Recommended Minimum Course) sentence
fn parse_rmc(data: &mut FixData, parts: &[&str]) {
    if parts.len() < 10 {
        return;
    }

    // Status (field 2): A = active, V = void
    if parts[2] == "V" {
        return;
    }

    // Latitude (field 3 and 4)
    if !parts[3].is_empty() && !parts[4].is_empty() {
        if let Ok(lat) = parts[3].parse::<f64>() {
            let lat_deg = (lat / 100.0) as i32;
            let lat_min = lat % 100.0;
            let mut latitude = lat_deg as f64 + lat_min / 60.0;
            if parts[4] == "S" {
                latitude = -latitude;
            }
            data.latitude = Some(latitude);
        }
    }

    // Longitude (field 5 and 6)
    if !parts[5].is_empty() && !parts[6].is_empty() {
        if let Ok(lon) = parts[5].parse::<f64>() {
            let lon_deg = (lon / 100.0) as i32;
            let lon_min = lon % 100.0;
            let mut longitude = lon_deg as f64 + lon_min / 60.0;
            if parts[6] == "W" {
                longitude = -longitude;
            }
            data.longitude = Some(longitude);
        }
    }

    // Speed over ground in knots (field 7)
    if !parts[7].is_empty() {
        if let Ok(speed_knots) = parts[7].parse::<f64>() {
            data.speed_mps = Some(speed_knots * KNOTS_TO_MPS);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gga_parsing() {
        let mut data = FixData::new();
        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

        parse_nmea_sentence(&mut data, gga);

        let lat = data.latitude.unwrap();
        let lon = data.longitude.unwrap();
        assert!((lat - 48.1173).abs() < 0.0001);
        assert!((lon - 11.5166).abs() < 0.0001);
    }

    #[test]
    fn test_rmc_parsing() {
        let mut data = FixData::new();
        let rmc = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

        parse_nmea_sentence(&mut data, rmc);

        assert!(data.has_position());
        // 22.4 knots in m/s
        assert!((data.speed_mps.unwrap() - 11.5235).abs() < 0.001);
    }

    #[test]
    fn test_rmc_void_status_ignored() {
        let mut data = FixData::new();
        let rmc = "$GPRMC,123519,V,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

        parse_nmea_sentence(&mut data, rmc);

        assert!(data.latitude.is_none());
        assert!(data.speed_mps.is_none());
    }

    #[test]
    fn test_southern_western_hemispheres() {
        let mut data = FixData::new();
        let gga = "$GPGGA,123519,3352.000,S,15112.000,W,1,08,0.9,10.0,M,46.9,M,,*47";

        parse_nmea_sentence(&mut data, gga);

        assert!(data.latitude.unwrap() < 0.0);
        assert!(data.longitude.unwrap() < 0.0);
    }

    #[test]
    fn test_invalid_sentence() {
        let mut data = FixData::new();
        parse_nmea_sentence(&mut data, "$INVALID,123,456");

        assert!(data.latitude.is_none());
        assert!(data.longitude.is_none());
    }
}
