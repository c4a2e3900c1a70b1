//! Provides platform specific logic: HTTP access, task spawning and geolocation.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(not(target_arch = "wasm32"))]
use maybe_sync::MaybeSend;

use crate::error::IncidentMapError;

/// HTTP operations the map view needs from the platform.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait HttpClient {
    /// Loads the body of the given url.
    async fn get(&self, url: &str) -> Result<Bytes, IncidentMapError>;
    /// Posts a JSON document to the url and returns the response body.
    async fn post_json(&self, url: &str, body: Vec<u8>) -> Result<Bytes, IncidentMapError>;
}

#[cfg(not(target_arch = "wasm32"))]
pub mod native;

/// Default implementation of the [`HttpClient`] for the current platform.
#[cfg(not(target_arch = "wasm32"))]
pub type HttpClientImpl = native::NativeHttpClient;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Default implementation of the [`HttpClient`] for the current platform.
#[cfg(target_arch = "wasm32")]
pub type HttpClientImpl = web::WebHttpClient;

/// Runs the future in the background on the platform runtime.
///
/// Natively the caller must be inside a `tokio` runtime context.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn<T>(future: T)
where
    T: Future + MaybeSend + 'static,
    T::Output: MaybeSend + 'static,
{
    tokio::spawn(future);
}

/// Runs the future in the background on the platform runtime.
#[cfg(target_arch = "wasm32")]
pub fn spawn<T>(future: T)
where
    T: Future + 'static,
    T::Output: 'static,
{
    wasm_bindgen_futures::spawn_local(async {
        future.await;
    });
}
