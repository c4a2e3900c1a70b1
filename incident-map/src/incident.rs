//! Incident records exchanged with the backend and the third-party traffic API.

use galileo_types::geo::impls::GeoPoint2d;
use galileo_types::geo::NewGeoPoint;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::IncidentMapError;
use crate::geo::ClickLocation;

/// Incident stored in the backend.
///
/// Coordinates travel as strings. Some backends echo them back as JSON numbers, so both
/// forms are accepted when reading. A missing or `null` coordinate is read as an empty
/// string, so one broken record does not fail the whole list; [`Incident::position`] reports
/// it instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Latitude in degrees.
    #[serde(deserialize_with = "coordinate_string", default)]
    pub lat: String,
    /// Longitude in degrees.
    #[serde(deserialize_with = "coordinate_string", default)]
    pub lng: String,
    /// Free text description.
    #[serde(rename = "shortDesc", default)]
    pub short_desc: String,
    /// Free text category.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Incident {
    /// Parses the stored coordinates.
    pub fn position(&self) -> Result<GeoPoint2d, IncidentMapError> {
        let lat = parse_coordinate(&self.lat)?;
        let lng = parse_coordinate(&self.lng)?;
        Ok(GeoPoint2d::latlon(lat, lng))
    }

    /// Creates an incident reported at the given click location.
    pub fn reported_at(
        location: &ClickLocation,
        short_desc: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            lat: location.lat_string(),
            lng: location.lon_string(),
            short_desc: short_desc.into(),
            kind: kind.into(),
        }
    }
}

/// Payload of an incident creation request. It has the same wire shape as [`Incident`].
pub type NewIncident = Incident;

/// Backend response to an incident creation request. The backend does not document its
/// shape, so the document is kept as is.
pub type SubmitAck = serde_json::Value;

/// Incident reported by the third-party traffic API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ThirdPartyIncident {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Short description.
    #[serde(rename = "shortDesc", default)]
    pub short_desc: String,
    /// Icon the provider suggests for the incident.
    #[serde(rename = "iconURL", default)]
    pub icon_url: String,
    /// Provider specific incident type code.
    #[serde(rename = "type", default)]
    pub kind: Option<i64>,
    /// Provider specific severity.
    #[serde(default)]
    pub severity: Option<i64>,
}

impl ThirdPartyIncident {
    /// Location of the incident.
    pub fn position(&self) -> GeoPoint2d {
        GeoPoint2d::latlon(self.lat, self.lng)
    }
}

/// Body of the third-party incidents response.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ThirdPartyIncidents {
    #[serde(default)]
    pub incidents: Vec<ThirdPartyIncident>,
}

fn parse_coordinate(value: &str) -> Result<f64, IncidentMapError> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(IncidentMapError::InvalidCoordinate(value.to_owned())),
    }
}

fn coordinate_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(v) => v,
        serde_json::Value::Number(v) => v.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
