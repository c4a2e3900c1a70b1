use bytes::Bytes;
use url::form_urlencoded;

use crate::config::MapViewConfig;
use crate::error::IncidentMapError;
use crate::geo::{BoundingBox, ClickLocation};
use crate::incident::{ThirdPartyIncident, ThirdPartyIncidents};
use crate::platform::HttpClient;

/// Client of the third-party traffic API: flow images and incident search.
#[derive(Debug, Clone)]
pub struct TrafficApi<H> {
    http: H,
    base_url: String,
    key: String,
    image_height: u32,
    image_width: u32,
    image_scale: u32,
    filters: String,
}

impl<H: HttpClient> TrafficApi<H> {
    /// Creates a client with endpoint, key and image parameters taken from the config.
    pub fn new(http: H, config: &MapViewConfig) -> Self {
        Self {
            http,
            base_url: config.traffic_api_base.trim_end_matches('/').to_owned(),
            key: config.api_key.clone(),
            image_height: config.traffic_image_height,
            image_width: config.traffic_image_width,
            image_scale: config.traffic_image_scale,
            filters: config.incident_filters.join(","),
        }
    }

    /// Url of the flow image centered at the location.
    pub fn flow_url(&self, location: &ClickLocation) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("key", &self.key)
            .append_pair("mapLat", &location.lat_string())
            .append_pair("mapLng", &location.lon_string())
            .append_pair("mapHeight", &self.image_height.to_string())
            .append_pair("mapWidth", &self.image_width.to_string())
            .append_pair("mapScale", &self.image_scale.to_string())
            .finish();
        format!("{}/flow?{query}", self.base_url)
    }

    /// Url of the incident search inside the box.
    pub fn incidents_url(&self, bbox: &BoundingBox) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("key", &self.key)
            .append_pair("boundingBox", &bbox.to_query_value())
            .append_pair("filters", &self.filters)
            .finish();
        format!("{}/incidents?{query}", self.base_url)
    }

    /// Loads the encoded flow image centered at the location.
    pub async fn flow_image(&self, location: &ClickLocation) -> Result<Bytes, IncidentMapError> {
        self.http.get(&self.flow_url(location)).await
    }

    /// Loads the incidents inside the box.
    pub async fn incidents(
        &self,
        bbox: &BoundingBox,
    ) -> Result<Vec<ThirdPartyIncident>, IncidentMapError> {
        let body = self.http.get(&self.incidents_url(bbox)).await?;
        let response: ThirdPartyIncidents = serde_json::from_slice(&body)?;
        log::debug!("Received {} third-party incidents", response.incidents.len());

        Ok(response.incidents)
    }
}
