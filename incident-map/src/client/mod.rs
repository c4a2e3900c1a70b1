//! Clients of the remote services: the incident backend and the third-party traffic API.

mod backend;
mod traffic_api;

pub use backend::IncidentBackend;
pub use traffic_api::TrafficApi;
