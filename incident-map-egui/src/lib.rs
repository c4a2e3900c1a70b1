//! Egui front end of the incident map.
//!
//! [`run`] builds the base map, registers the click handler and starts the
//! [`IncidentMapApp`](app::IncidentMapApp) through `galileo_egui`, which also sets up logging
//! and the async runtime for the current platform.

use std::sync::Arc;

use galileo::control::{EventPropagation, MouseButton, UserEvent, UserEventHandler};
use galileo::layer::raster_tile_layer::RasterTileLayerBuilder;
use galileo::{Map, MapBuilder};
use galileo_egui::InitBuilder;
use incident_map::galileo_types::cartesian::CartesianPoint2d;
use incident_map::{HttpClientImpl, IncidentMapError, MapViewConfig};
use parking_lot::Mutex;
use thiserror::Error;

pub mod app;
mod icons;
mod messenger;
mod overlays;

/// Screen positions of clicks made on the map, waiting for the next frame.
pub type ClickQueue = Arc<Mutex<Vec<[f64; 2]>>>;

/// Error that prevents the application from starting.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failure of the core library.
    #[error(transparent)]
    Core(#[from] IncidentMapError),
    /// Configuration file cannot be read.
    #[error("failed to read configuration: {0}")]
    Config(#[from] std::io::Error),
    /// Base map layer cannot be created.
    #[error("failed to create base layer: {0}")]
    Layer(String),
    /// Window or canvas cannot be initialized.
    #[error("failed to start ui: {0}")]
    Ui(String),
}

/// Starts the application.
pub fn run(config: MapViewConfig) -> Result<(), AppError> {
    let http = HttpClientImpl::new()?;
    let map = create_map(&config)?;
    let clicks = ClickQueue::default();
    let handler = create_click_handler(clicks.clone());

    InitBuilder::new(map)
        .with_handlers([Box::new(handler) as Box<dyn UserEventHandler>])
        .with_app_builder(move |egui_map_state| {
            Box::new(app::IncidentMapApp::new(egui_map_state, config, http, clicks))
        })
        .init()
        .map_err(|err| AppError::Ui(err.to_string()))
}

fn create_map(config: &MapViewConfig) -> Result<Map, AppError> {
    let builder = RasterTileLayerBuilder::new_osm();
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder.with_file_cache_checked(".tile_cache");
    let layer = builder
        .build()
        .map_err(|err| AppError::Layer(format!("{err:?}")))?;

    Ok(MapBuilder::default()
        .with_latlon(config.initial_lat, config.initial_lon)
        .with_z_level(config.initial_z_level)
        .with_layer(layer)
        .build())
}

/// Queues left clicks. Dragging and zooming are left to the map controller.
fn create_click_handler(clicks: ClickQueue) -> impl UserEventHandler {
    move |ev: &UserEvent, _map: &mut Map| {
        if let UserEvent::Click(MouseButton::Left, event) = ev {
            let position = event.screen_pointer_position;
            clicks.lock().push([position.x(), position.y()]);
        }

        EventPropagation::Propagate
    }
}
