use crate::error::IncidentMapError;
use crate::incident::{Incident, NewIncident, SubmitAck};
use crate::platform::HttpClient;

/// Client of the backend incident collection.
#[derive(Debug, Clone)]
pub struct IncidentBackend<H> {
    http: H,
    url: String,
}

impl<H: HttpClient> IncidentBackend<H> {
    /// Creates a client of the collection at `url`.
    pub fn new(http: H, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Loads all stored incidents.
    pub async fn list_incidents(&self) -> Result<Vec<Incident>, IncidentMapError> {
        let body = self.http.get(&self.url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Stores a new incident and returns the backend acknowledgement.
    ///
    /// Errors are returned as is, the request is never retried.
    pub async fn submit_incident(
        &self,
        incident: &NewIncident,
    ) -> Result<SubmitAck, IncidentMapError> {
        let body = serde_json::to_vec(incident)?;
        let response = self.http.post_json(&self.url, body).await?;
        let ack: SubmitAck = serde_json::from_slice(&response)?;
        log::debug!("Incident stored: {ack}");

        Ok(ack)
    }
}
