//! Core of the incident map: everything the map view does besides drawing.
//!
//! The view shows a base map with the user's position, the incidents stored in a small
//! backend service and, on demand, traffic data from a third-party traffic API. What a click
//! on the map does depends on the selected [`Mode`]:
//!
//! * [`Mode::Traffic`] shows the traffic flow image around the click for a few seconds,
//! * [`Mode::Incidents`] replaces the incident markers with third-party incidents around
//!   the click,
//! * [`Mode::AddIncident`] asks the user for a description and type and stores a new incident
//!   at the click location.
//!
//! # Main components
//!
//! * [`MapViewState`] holds the state of the view. It is a plain synchronous state machine:
//!   input methods return [`Command`]s and results are fed back as [`Outcome`]s.
//! * [`TaskRunner`] executes commands on the platform runtime (`tokio` natively, the browser
//!   event loop on `wasm32`) using the [`IncidentBackend`] and [`TrafficApi`] clients and
//!   sends outcomes back through an [`OutcomeReceiver`].
//! * [`GeolocationWatch`] tracks the device position where the platform supports it.
//!
//! ```no_run
//! use incident_map::{HttpClientImpl, MapViewConfig, MapViewState, TaskRunner};
//! use web_time::Instant;
//!
//! let config = MapViewConfig::default();
//! let http = HttpClientImpl::new().expect("failed to create http client");
//! let (runner, mut outcomes) = TaskRunner::new(http, &config);
//! let mut state = MapViewState::new(config);
//!
//! runner.execute_all(state.initial_commands());
//!
//! // on every frame
//! for outcome in outcomes.drain() {
//!     let follow_up = state.apply(outcome, Instant::now());
//!     runner.execute_all(follow_up);
//! }
//! state.tick(Instant::now());
//! ```

#![warn(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod decoded_image;
pub mod error;
pub mod geo;
mod geolocation;
pub mod incident;
mod messenger;
pub mod mode;
pub mod overlay;
pub mod platform;
mod runner;
pub mod traffic;
pub mod view;

#[cfg(test)]
mod tests;

pub use client::{IncidentBackend, TrafficApi};
pub use config::MapViewConfig;
pub use error::IncidentMapError;
pub use geolocation::{GeolocationWatch, PositionCallback};
pub use messenger::{DummyMessenger, Messenger};
pub use mode::Mode;
pub use platform::HttpClientImpl;
pub use runner::{OutcomeReceiver, TaskRunner};
pub use view::{Command, MapViewState, Outcome};

// Reexport galileo_types
pub use galileo_types;
