//! Native incident map application.
//!
//! Settings are read from `incident-map.json` in the working directory when the file exists.

use std::path::Path;

use incident_map::MapViewConfig;
use incident_map_egui::{run, AppError};

const CONFIG_FILE: &str = "incident-map.json";

fn load_config() -> Result<MapViewConfig, AppError> {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Ok(MapViewConfig::default());
    }

    let json = std::fs::read_to_string(path)?;
    Ok(MapViewConfig::from_json(&json)?)
}

fn main() -> Result<(), AppError> {
    run(load_config()?)
}
