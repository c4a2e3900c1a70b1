//! Click handling modes and the dispatch of a click to an action.

use crate::geo::{BoundingBox, ClickLocation};

/// Behaviour of a map click, selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Nothing selected; clicks only move the marker.
    #[default]
    Unset,
    /// Show the traffic flow image around the click.
    Traffic,
    /// Show third-party incidents around the click.
    Incidents,
    /// Report a new incident at the click.
    AddIncident,
}

impl Mode {
    /// All modes in the order they are offered to the user.
    pub const ALL: [Mode; 4] = [Mode::Unset, Mode::Traffic, Mode::Incidents, Mode::AddIncident];

    /// Label shown in the mode selector.
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Unset => "select option...",
            Mode::Traffic => "Traffic",
            Mode::Incidents => "Incidents",
            Mode::AddIncident => "Add incident",
        }
    }
}

/// What a click in a given mode should do, beyond moving the marker and the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickAction {
    /// Nothing else.
    RecenterOnly,
    /// Fetch the traffic flow image centered on the location.
    FetchTraffic(ClickLocation),
    /// Replace the incident overlays with third-party incidents inside the box.
    FetchIncidents(BoundingBox),
    /// Ask the user for details and report an incident at the location.
    ReportIncident(ClickLocation),
}

/// Decides what a click does. `pad` is the half size of the incident search box in degrees.
pub fn click_action(mode: Mode, location: ClickLocation, pad: f64) -> ClickAction {
    match mode {
        Mode::Unset => ClickAction::RecenterOnly,
        Mode::Traffic => ClickAction::FetchTraffic(location),
        Mode::Incidents => ClickAction::FetchIncidents(BoundingBox::around(&location, pad)),
        Mode::AddIncident => ClickAction::ReportIncident(location),
    }
}
