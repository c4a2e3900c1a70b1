//! Error types used by the crate.

use thiserror::Error;

/// Incident map error type.
#[derive(Debug, Error)]
pub enum IncidentMapError {
    /// Transport failure (connection refused, DNS, aborted request).
    #[error("failed to load data: {0}")]
    Io(String),
    /// The server answered with a non-success status code.
    #[error("request to {url} failed with status {status}")]
    HttpStatus {
        /// Requested url.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },
    /// Response body is not the expected JSON document.
    #[error("failed to decode response: {0}")]
    Decoding(#[from] serde_json::Error),
    /// Image decoding error.
    #[error("image decode error: {0:?}")]
    ImageDecode(#[from] image::ImageError),
    /// A coordinate in an incident record is not a number.
    #[error("invalid coordinate value '{0}'")]
    InvalidCoordinate(String),
    /// Error interacting with WASM runtime.
    #[error("wasm error: {0:?}")]
    Wasm(Option<String>),
    /// Geolocation is not available on this platform or was denied.
    #[error("geolocation unavailable: {0}")]
    GeolocationUnavailable(String),
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for IncidentMapError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::HttpStatus {
                url: value.url().map(|url| url.to_string()).unwrap_or_default(),
                status: status.as_u16(),
            },
            None => Self::Io(value.to_string()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for IncidentMapError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        IncidentMapError::Wasm(Some(format!("{value:?}")))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<js_sys::Object> for IncidentMapError {
    fn from(value: js_sys::Object) -> Self {
        IncidentMapError::Wasm(Some(format!("Failed to cast {value:?} into target type")))
    }
}
