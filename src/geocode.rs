// src/geocode.rs
//! Reverse geocoding via the Nominatim HTTP API

use crate::error::Result;

const NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

/// Resolves coordinates to a human-readable address.
///
/// A failed or empty lookup is not an error at the call site: the result is
/// `Ok(None)` or `Err`, and the caller falls back to showing raw
/// coordinates via [`format_coordinates`]. Lookups are never retried.
pub struct ReverseGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl ReverseGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(NOMINATIM_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        // Nominatim usage policy requires an identifying User-Agent
        let client = reqwest::Client::builder()
            .user_agent("GpsDistanceTracker/1.0 (Rust GPS tracking application)")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Look up the address for a coordinate pair. `Ok(None)` when the
    /// service has no result for the location.
    pub async fn lookup(&self, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}",
            self.endpoint, latitude, longitude
        );

        let response = self.client.get(&url).send().await?;
        let body: serde_json::Value = response.error_for_status()?.json().await?;

        Ok(parse_reverse_response(&body))
    }
}

/// Extract the display address from a Nominatim reverse response. Error
/// bodies ({"error": ...}) and responses without a display name yield None.
pub fn parse_reverse_response(body: &serde_json::Value) -> Option<String> {
    if body.get("error").is_some() {
        return None;
    }

    body.get("display_name")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Raw-coordinate fallback shown when no address could be resolved
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    format!("{:.6}, {:.6}", latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_name() {
        let body = serde_json::json!({
            "place_id": 128271723,
            "display_name": "Marienplatz, Altstadt, Munich, Bavaria, Germany",
            "lat": "48.1373968",
            "lon": "11.5754485"
        });

        assert_eq!(
            parse_reverse_response(&body),
            Some("Marienplatz, Altstadt, Munich, Bavaria, Germany".to_string())
        );
    }

    #[test]
    fn test_parse_error_body() {
        let body = serde_json::json!({ "error": "Unable to geocode" });
        assert_eq!(parse_reverse_response(&body), None);
    }

    #[test]
    fn test_parse_missing_display_name() {
        let body = serde_json::json!({ "place_id": 1 });
        assert_eq!(parse_reverse_response(&body), None);
    }

    #[test]
    fn test_parse_empty_display_name() {
        let body = serde_json::json!({ "display_name": "" });
        assert_eq!(parse_reverse_response(&body), None);
    }

    #[test]
    fn test_coordinate_fallback_format() {
        // {:.6} rounds, it does not truncate
        assert_eq!(format_coordinates(48.1373968, 11.5754485), "48.137397, 11.575449");
        assert_eq!(format_coordinates(-33.86, 151.21), "-33.860000, 151.210000");
    }
}
