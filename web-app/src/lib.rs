//! Browser entry points of the incident map.
//!
//! The page must contain a canvas with id `the_canvas_id`, see `index.html`.

use incident_map::MapViewConfig;
use wasm_bindgen::prelude::*;

/// Starts the application with the default configuration.
#[wasm_bindgen]
pub fn main() -> Result<(), JsValue> {
    start(MapViewConfig::default())
}

/// Starts the application with a JSON configuration document. Fields missing from the
/// document take their default values.
#[wasm_bindgen]
pub fn run_with_config(config: &str) -> Result<(), JsValue> {
    let config =
        MapViewConfig::from_json(config).map_err(|err| JsValue::from_str(&err.to_string()))?;
    start(config)
}

fn start(config: MapViewConfig) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    incident_map_egui::run(config).map_err(|err| JsValue::from_str(&err.to_string()))
}
