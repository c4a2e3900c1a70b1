//! Platform specific stuff for WASM32 (web) targets.

use async_trait::async_trait;
use bytes::Bytes;
use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::error::IncidentMapError;
use crate::platform::HttpClient;

/// [`HttpClient`] using the browser `fetch` API.
#[derive(Debug, Clone, Default)]
pub struct WebHttpClient {}

impl WebHttpClient {
    /// Creates a new client.
    pub fn new() -> Result<Self, IncidentMapError> {
        Ok(Self {})
    }

    async fn fetch(
        &self,
        url: &str,
        method: &str,
        json_body: Option<Vec<u8>>,
    ) -> Result<Bytes, IncidentMapError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        let has_body = json_body.is_some();
        if let Some(body) = json_body {
            let body = Uint8Array::from(body.as_slice());
            opts.set_body(&JsValue::from(body));
        }

        let request = Request::new_with_str_and_init(url, &opts)?;
        if has_body {
            request.headers().set("Content-Type", "application/json")?;
        }

        let window = web_sys::window()
            .ok_or_else(|| IncidentMapError::Wasm(Some("Global object is not available".into())))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            return Err(IncidentMapError::HttpStatus {
                url: url.to_owned(),
                status: resp.status(),
            });
        }

        let bytes_val = JsFuture::from(resp.array_buffer()?).await?;
        let array = Uint8Array::new(&bytes_val);
        Ok(array.to_vec().into())
    }
}

#[async_trait(?Send)]
impl HttpClient for WebHttpClient {
    async fn get(&self, url: &str) -> Result<Bytes, IncidentMapError> {
        log::debug!("GET {url}");
        self.fetch(url, "GET", None).await
    }

    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Bytes, IncidentMapError> {
        log::debug!("POST {url}");
        self.fetch(url, "POST", Some(body)).await
    }
}
