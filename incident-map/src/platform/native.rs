//! Platform specific stuff for native targets.

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};

use crate::error::IncidentMapError;
use crate::platform::HttpClient;

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct NativeHttpClient {
    http_client: reqwest::Client,
}

impl NativeHttpClient {
    /// Creates a new client.
    pub fn new() -> Result<Self, IncidentMapError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("incident-map/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client })
    }

    async fn read_body(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<Bytes, IncidentMapError> {
        let status = response.status();
        if !status.is_success() {
            info!(
                "Failed to load {url}: {}, {:?}",
                status,
                response.text().await
            );
            return Err(IncidentMapError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl HttpClient for NativeHttpClient {
    async fn get(&self, url: &str) -> Result<Bytes, IncidentMapError> {
        debug!("GET {url}");
        let response = self.http_client.get(url).send().await?;
        self.read_body(url, response).await
    }

    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Bytes, IncidentMapError> {
        debug!("POST {url}");
        let response = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        self.read_body(url, response).await
    }
}
