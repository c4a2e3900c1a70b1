//! Runtime configuration of the map view and its remote services.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::IncidentMapError;

/// Endpoints, icons and tuning values used by the map view.
///
/// All fields have defaults, so a configuration document only needs to list the values it
/// overrides:
///
/// ```
/// use incident_map::MapViewConfig;
///
/// let config = MapViewConfig::from_json(r#"{ "api_key": "secret" }"#).unwrap();
/// assert_eq!(config.api_key, "secret");
/// assert_eq!(config.backend_url, "http://localhost:3001/incidents");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapViewConfig {
    /// Url of the backend incident collection (`GET` lists, `POST` creates).
    pub backend_url: String,
    /// Base url of the third-party traffic API. `/flow` and `/incidents` are appended to it.
    pub traffic_api_base: String,
    /// Key sent with every third-party request.
    pub api_key: String,
    /// Icon of the user position marker.
    pub user_marker_icon: String,
    /// Icon used for incidents stored in the backend.
    pub incident_icon: String,
    /// Height of the requested traffic flow image in pixels.
    pub traffic_image_height: u32,
    /// Width of the requested traffic flow image in pixels.
    pub traffic_image_width: u32,
    /// Scale of the requested traffic flow image.
    pub traffic_image_scale: u32,
    /// How long a traffic image stays visible, in milliseconds.
    pub traffic_image_ttl_ms: u64,
    /// Padding (degrees) added on each side of a click to build the incident search box.
    pub bounding_box_pad: f64,
    /// Categories requested from the third-party incidents endpoint.
    pub incident_filters: Vec<String>,
    /// Z-level the view zooms to when following a position or a click.
    pub follow_z_level: u32,
    /// Latitude of the initial view center.
    pub initial_lat: f64,
    /// Longitude of the initial view center.
    pub initial_lon: f64,
    /// Z-level of the initial view.
    pub initial_z_level: u32,
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3001/incidents".into(),
            traffic_api_base: "https://www.mapquestapi.com/traffic/v2".into(),
            api_key: String::new(),
            user_marker_icon: "https://assets.mapquestapi.com/icon/v2/marker-sm-7B0099.png"
                .into(),
            incident_icon: "http://content.mqcdn.com/mqtraffic/incid_min.png".into(),
            traffic_image_height: 800,
            traffic_image_width: 1000,
            traffic_image_scale: 108335,
            traffic_image_ttl_ms: 5000,
            bounding_box_pad: 0.01,
            incident_filters: vec!["construction".into(), "incidents".into()],
            follow_z_level: 12,
            initial_lat: 0.0,
            initial_lon: 0.0,
            initial_z_level: 2,
        }
    }
}

impl MapViewConfig {
    /// Parses a JSON configuration document. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, IncidentMapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Time a traffic image stays on screen.
    pub fn traffic_image_ttl(&self) -> Duration {
        Duration::from_millis(self.traffic_image_ttl_ms)
    }
}
