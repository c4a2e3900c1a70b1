use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::error::IncidentMapError;
use crate::platform::HttpClient;

/// 2x1 PNG: one opaque red pixel, one half transparent blue pixel.
pub const TWO_PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0xF4, 0x22, 0x7F,
    0x8A, 0x00, 0x00, 0x00, 0x0E, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0xF8, 0xCF, 0xC0, 0x00,
    0x42, 0x0D, 0x00, 0x0F, 0x7A, 0x03, 0x7E, 0x77, 0xE9, 0x7F, 0x97, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Get(String),
    Post(String, Vec<u8>),
}

/// In-memory HTTP client. Urls without a registered response fail with
/// [`IncidentMapError::Io`].
#[derive(Debug, Clone, Default)]
pub struct FakeHttpClient {
    responses: Arc<Mutex<HashMap<String, Bytes>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl FakeHttpClient {
    pub fn respond(&self, url: &str, body: impl AsRef<[u8]>) {
        self.responses
            .lock()
            .insert(url.to_owned(), Bytes::copy_from_slice(body.as_ref()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    fn response(&self, url: &str) -> Result<Bytes, IncidentMapError> {
        self.responses
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| IncidentMapError::Io(format!("no response for {url}")))
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn get(&self, url: &str) -> Result<Bytes, IncidentMapError> {
        self.requests.lock().push(RecordedRequest::Get(url.to_owned()));
        self.response(url)
    }

    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Bytes, IncidentMapError> {
        self.requests
            .lock()
            .push(RecordedRequest::Post(url.to_owned(), body));
        self.response(url)
    }
}
