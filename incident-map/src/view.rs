//! State of the map view and the rules that change it.
//!
//! [`MapViewState`] owns everything the view shows besides the base map: the user marker,
//! the incident overlays, the traffic image and the incident report being entered. It never
//! performs I/O itself. User input produces [`Command`]s, which are executed by a
//! [`TaskRunner`](crate::TaskRunner), and their results come back as [`Outcome`]s to
//! [`MapViewState::apply`].
//!
//! Every command that writes shared state carries a generation number. Incident lists (from
//! the backend and from the third-party API) share one counter because they both replace
//! the overlay collection, traffic images have their own. An outcome whose generation is not
//! the latest issued for its target is dropped, so a slow response can never overwrite the
//! result of a newer click.

use galileo_types::geo::impls::GeoPoint2d;
use web_time::Instant;

use crate::config::MapViewConfig;
use crate::decoded_image::DecodedImage;
use crate::error::IncidentMapError;
use crate::geo::{BoundingBox, ClickLocation};
use crate::incident::{Incident, NewIncident, SubmitAck, ThirdPartyIncident};
use crate::mode::{click_action, ClickAction, Mode};
use crate::overlay::{Overlay, OverlayCollection};
use crate::traffic::TrafficSnapshot;

/// Work the view asks to be done asynchronously.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load the backend incident list.
    LoadIncidents {
        /// Overlay generation of the request.
        generation: u64,
    },
    /// Load the traffic flow image for the location.
    LoadTraffic {
        /// Traffic generation of the request.
        generation: u64,
        /// Center of the image.
        location: ClickLocation,
    },
    /// Search third-party incidents inside the box.
    LoadThirdPartyIncidents {
        /// Overlay generation of the request.
        generation: u64,
        /// Search area.
        bbox: BoundingBox,
    },
    /// Store a new incident in the backend.
    SubmitIncident {
        /// The incident to store.
        incident: NewIncident,
    },
}

/// Result of a [`Command`] or an event coming from outside the UI.
#[derive(Debug)]
pub enum Outcome {
    /// Result of [`Command::LoadIncidents`].
    Incidents {
        /// Generation of the request.
        generation: u64,
        /// Loaded list.
        result: Result<Vec<Incident>, IncidentMapError>,
    },
    /// Result of [`Command::LoadTraffic`].
    Traffic {
        /// Generation of the request.
        generation: u64,
        /// Center of the image.
        location: ClickLocation,
        /// Decoded image.
        result: Result<DecodedImage, IncidentMapError>,
    },
    /// Result of [`Command::LoadThirdPartyIncidents`].
    ThirdPartyIncidents {
        /// Generation of the request.
        generation: u64,
        /// Loaded list.
        result: Result<Vec<ThirdPartyIncident>, IncidentMapError>,
    },
    /// Result of [`Command::SubmitIncident`].
    IncidentSubmitted {
        /// Backend acknowledgement.
        result: Result<SubmitAck, IncidentMapError>,
    },
    /// The device reported a new position.
    Position(GeoPoint2d),
}

/// Request to move the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRequest {
    /// New view center.
    pub position: GeoPoint2d,
    /// Target z-level.
    pub z_level: u32,
}

/// Incident report waiting for the user to enter its details.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReport {
    location: ClickLocation,
    /// Short description entered so far.
    pub description: String,
    /// Incident type entered so far.
    pub kind: String,
}

impl PendingReport {
    /// Where the incident will be reported.
    pub fn location(&self) -> ClickLocation {
        self.location
    }
}

/// State of the map view.
#[derive(Debug)]
pub struct MapViewState {
    config: MapViewConfig,
    mode: Mode,
    user_marker: Option<Overlay>,
    overlays: OverlayCollection,
    traffic: Option<TrafficSnapshot>,
    pending_report: Option<PendingReport>,
    camera_request: Option<CameraRequest>,
    overlay_generation: u64,
    traffic_generation: u64,
    snapshot_counter: u64,
}

impl MapViewState {
    /// Creates an empty state.
    pub fn new(config: MapViewConfig) -> Self {
        if config.api_key.is_empty() {
            log::warn!("No traffic API key is configured, traffic lookups will be rejected");
        }

        Self {
            config,
            mode: Mode::Unset,
            user_marker: None,
            overlays: OverlayCollection::default(),
            traffic: None,
            pending_report: None,
            camera_request: None,
            overlay_generation: 0,
            traffic_generation: 0,
            snapshot_counter: 0,
        }
    }

    /// Configuration the state was created with.
    pub fn config(&self) -> &MapViewConfig {
        &self.config
    }

    /// Commands to run when the view is mounted.
    pub fn initial_commands(&mut self) -> Vec<Command> {
        vec![self.load_incidents()]
    }

    /// Currently selected mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Changes the click behaviour.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            log::debug!("Mode changed from {:?} to {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    /// Marker showing the user position or the last click.
    pub fn user_marker(&self) -> Option<&Overlay> {
        self.user_marker.as_ref()
    }

    /// Incident overlays currently shown.
    pub fn overlays(&self) -> &OverlayCollection {
        &self.overlays
    }

    /// Traffic image currently shown.
    pub fn traffic_snapshot(&self) -> Option<&TrafficSnapshot> {
        self.traffic.as_ref()
    }

    /// Incident report waiting for user input.
    pub fn pending_report(&self) -> Option<&PendingReport> {
        self.pending_report.as_ref()
    }

    /// Mutable access to the pending report, used by the input dialog.
    pub fn pending_report_mut(&mut self) -> Option<&mut PendingReport> {
        self.pending_report.as_mut()
    }

    /// Takes the last requested view change, if any.
    pub fn take_camera_request(&mut self) -> Option<CameraRequest> {
        self.camera_request.take()
    }

    /// Moves the user marker to the new device position and follows it with the view.
    pub fn on_position(&mut self, position: GeoPoint2d) {
        self.move_marker(position);
    }

    /// Handles a click at the given geographic position.
    pub fn on_click(&mut self, position: GeoPoint2d) -> Vec<Command> {
        let location = ClickLocation::from(&position);
        log::info!("{location}");
        self.move_marker(position);

        match click_action(self.mode, location, self.config.bounding_box_pad) {
            ClickAction::RecenterOnly => vec![],
            ClickAction::FetchTraffic(location) => {
                self.traffic_generation += 1;
                vec![Command::LoadTraffic {
                    generation: self.traffic_generation,
                    location,
                }]
            }
            ClickAction::FetchIncidents(bbox) => {
                self.overlays.clear_all();
                self.overlay_generation += 1;
                vec![Command::LoadThirdPartyIncidents {
                    generation: self.overlay_generation,
                    bbox,
                }]
            }
            ClickAction::ReportIncident(location) => {
                match &mut self.pending_report {
                    Some(report) => report.location = location,
                    None => {
                        self.pending_report = Some(PendingReport {
                            location,
                            description: String::new(),
                            kind: String::new(),
                        })
                    }
                }
                vec![self.load_incidents()]
            }
        }
    }

    /// Finishes the pending report and returns the command that submits it.
    pub fn submit_report(&mut self) -> Option<Command> {
        let report = self.pending_report.take()?;
        let incident = Incident::reported_at(&report.location, report.description, report.kind);
        log::info!("Reporting incident {incident:?}");

        Some(Command::SubmitIncident { incident })
    }

    /// Drops the pending report without submitting it.
    pub fn cancel_report(&mut self) {
        if let Some(report) = self.pending_report.take() {
            log::debug!("Incident report at {} cancelled", report.location);
        }
    }

    /// Folds an asynchronous result into the state. Returns follow-up commands.
    ///
    /// Failed requests are logged and leave the state as it was.
    pub fn apply(&mut self, outcome: Outcome, now: Instant) -> Vec<Command> {
        match outcome {
            Outcome::Incidents { generation, result } => {
                if self.is_stale_overlay(generation) {
                    return vec![];
                }

                match result {
                    Ok(incidents) => {
                        let icon = self.config.incident_icon.clone();
                        self.overlays.replace_all(
                            incidents
                                .iter()
                                .filter_map(|incident| Overlay::from_incident(incident, &icon)),
                        );
                    }
                    Err(err) => log::error!("Error fetching incidents: {err}"),
                }
            }
            Outcome::ThirdPartyIncidents { generation, result } => {
                if self.is_stale_overlay(generation) {
                    return vec![];
                }

                match result {
                    Ok(incidents) => self
                        .overlays
                        .replace_all(incidents.iter().map(Overlay::from_third_party)),
                    Err(err) => log::error!("Error fetching data: {err}"),
                }
            }
            Outcome::Traffic {
                generation,
                location,
                result,
            } => {
                if generation != self.traffic_generation {
                    log::debug!("Dropping stale traffic image for {location}");
                    return vec![];
                }

                match result {
                    Ok(image) => {
                        self.snapshot_counter += 1;
                        self.traffic = Some(TrafficSnapshot::new(
                            self.snapshot_counter,
                            location,
                            image,
                            now,
                            self.config.traffic_image_ttl(),
                        ));
                    }
                    Err(err) => log::error!("Error fetching data: {err}"),
                }
            }
            Outcome::IncidentSubmitted { result } => match result {
                Ok(_) => return vec![self.load_incidents()],
                Err(err) => log::error!("Error adding new incident: {err}"),
            },
            Outcome::Position(position) => self.on_position(position),
        }

        vec![]
    }

    /// Hides the traffic image once its display time is over. Returns true if the state
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self
            .traffic
            .as_ref()
            .is_some_and(|snapshot| snapshot.is_expired(now))
        {
            self.traffic = None;
            return true;
        }

        false
    }

    fn load_incidents(&mut self) -> Command {
        self.overlay_generation += 1;
        Command::LoadIncidents {
            generation: self.overlay_generation,
        }
    }

    fn is_stale_overlay(&self, generation: u64) -> bool {
        let stale = generation != self.overlay_generation;
        if stale {
            log::debug!(
                "Dropping incident list of generation {generation}, latest is {}",
                self.overlay_generation
            );
        }

        stale
    }

    fn move_marker(&mut self, position: GeoPoint2d) {
        self.user_marker = Some(Overlay::user_position(
            position,
            self.config.user_marker_icon.as_str(),
        ));
        self.camera_request = Some(CameraRequest {
            position,
            z_level: self.config.follow_z_level,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use galileo_types::latlon;

    use super::*;
    use crate::overlay::OverlayKind;

    fn backend_incident(lat: &str, lng: &str, desc: &str) -> Incident {
        Incident {
            lat: lat.into(),
            lng: lng.into(),
            short_desc: desc.into(),
            kind: "hazard".into(),
        }
    }

    fn third_party(lat: f64, lng: f64) -> ThirdPartyIncident {
        ThirdPartyIncident {
            lat,
            lng,
            short_desc: "Roadworks".into(),
            icon_url: "http://icons/roadworks.png".into(),
            kind: None,
            severity: None,
        }
    }

    fn image() -> DecodedImage {
        DecodedImage {
            bytes: vec![0; 4],
            dimensions: (1, 1),
        }
    }

    fn mounted() -> (MapViewState, u64) {
        let mut state = MapViewState::new(MapViewConfig::default());
        let commands = state.initial_commands();
        let [Command::LoadIncidents { generation }] = commands[..] else {
            panic!("unexpected initial commands {commands:?}");
        };
        (state, generation)
    }

    #[test]
    fn mount_loads_incidents_once() {
        let (mut state, generation) = mounted();
        state.apply(
            Outcome::Incidents {
                generation,
                result: Ok(vec![backend_incident("1.0", "2.0", "pothole")]),
            },
            Instant::now(),
        );

        assert_eq!(state.overlays().len(), 1);
        let overlay = state.overlays().iter().next().unwrap();
        assert_eq!(overlay.kind, OverlayKind::Incident);
        assert_eq!(overlay.position, latlon!(1.0, 2.0));
        assert_eq!(overlay.description.as_deref(), Some("pothole"));
        assert_eq!(overlay.icon_url, state.config().incident_icon);
        assert!(state.user_marker().is_none());
    }

    #[test]
    fn refresh_does_not_duplicate_overlays() {
        let (mut state, generation) = mounted();
        let list = vec![
            backend_incident("1.0", "2.0", "a"),
            backend_incident("3.0", "4.0", "b"),
        ];
        state.apply(
            Outcome::Incidents {
                generation,
                result: Ok(list.clone()),
            },
            Instant::now(),
        );

        state.set_mode(Mode::AddIncident);
        let commands = state.on_click(latlon!(0.0, 0.0));
        let [Command::LoadIncidents { generation }] = commands[..] else {
            panic!("unexpected commands {commands:?}");
        };
        state.apply(
            Outcome::Incidents {
                generation,
                result: Ok(list),
            },
            Instant::now(),
        );

        assert_eq!(state.overlays().len(), 2);
    }

    #[test]
    fn click_moves_marker_and_requests_camera() {
        let (mut state, _) = mounted();
        let commands = state.on_click(latlon!(50.5678, 10.1234));

        assert!(commands.is_empty());
        let marker = state.user_marker().unwrap();
        assert_eq!(marker.kind, OverlayKind::UserPosition);
        assert_eq!(marker.position, latlon!(50.5678, 10.1234));
        assert_eq!(
            state.take_camera_request(),
            Some(CameraRequest {
                position: latlon!(50.5678, 10.1234),
                z_level: 12
            })
        );
        assert_eq!(state.take_camera_request(), None);
    }

    #[test]
    fn position_update_moves_marker() {
        let (mut state, _) = mounted();
        state.apply(Outcome::Position(latlon!(48.0, 11.0)), Instant::now());

        assert_eq!(state.user_marker().unwrap().position, latlon!(48.0, 11.0));
        assert_matches!(state.take_camera_request(), Some(CameraRequest { z_level: 12, .. }));
    }

    #[test]
    fn incidents_click_clears_before_adding() {
        let (mut state, generation) = mounted();
        state.apply(
            Outcome::Incidents {
                generation,
                result: Ok(vec![
                    backend_incident("1.0", "2.0", "a"),
                    backend_incident("1.5", "2.5", "b"),
                    backend_incident("1.7", "2.7", "c"),
                ]),
            },
            Instant::now(),
        );
        assert_eq!(state.overlays().len(), 3);

        state.set_mode(Mode::Incidents);
        let commands = state.on_click(latlon!(40.0, -75.0));
        assert!(state.overlays().is_empty());
        let [Command::LoadThirdPartyIncidents { generation, bbox }] = commands[..] else {
            panic!("unexpected commands {commands:?}");
        };
        assert!(bbox.contains(&latlon!(40.0, -75.0)));

        state.apply(
            Outcome::ThirdPartyIncidents {
                generation,
                result: Ok(vec![third_party(40.001, -75.001)]),
            },
            Instant::now(),
        );
        assert_eq!(state.overlays().len(), 1);
        let overlay = state.overlays().iter().next().unwrap();
        assert_eq!(overlay.kind, OverlayKind::ThirdPartyIncident);
        assert_eq!(overlay.icon_url, "http://icons/roadworks.png");
    }

    #[test]
    fn stale_incident_list_is_dropped() {
        let (mut state, initial_generation) = mounted();
        state.set_mode(Mode::Incidents);
        let commands = state.on_click(latlon!(40.0, -75.0));
        let [Command::LoadThirdPartyIncidents { generation, .. }] = commands[..] else {
            panic!("unexpected commands {commands:?}");
        };

        state.apply(
            Outcome::ThirdPartyIncidents {
                generation,
                result: Ok(vec![third_party(40.0, -75.0), third_party(40.005, -75.0)]),
            },
            Instant::now(),
        );
        // the mount request answers last
        state.apply(
            Outcome::Incidents {
                generation: initial_generation,
                result: Ok(vec![backend_incident("1.0", "2.0", "late")]),
            },
            Instant::now(),
        );

        assert_eq!(state.overlays().len(), 2);
        assert!(state
            .overlays()
            .iter()
            .all(|o| o.kind == OverlayKind::ThirdPartyIncident));
    }

    #[test]
    fn failed_request_leaves_state() {
        let (mut state, generation) = mounted();
        state.apply(
            Outcome::Incidents {
                generation,
                result: Ok(vec![backend_incident("1.0", "2.0", "a")]),
            },
            Instant::now(),
        );

        state.set_mode(Mode::Traffic);
        let commands = state.on_click(latlon!(0.0, 0.0));
        let [Command::LoadTraffic { generation, location }] = commands[..] else {
            panic!("unexpected commands {commands:?}");
        };
        state.apply(
            Outcome::Traffic {
                generation,
                location,
                result: Err(IncidentMapError::Io("connection refused".into())),
            },
            Instant::now(),
        );

        assert!(state.traffic_snapshot().is_none());
        assert_eq!(state.overlays().len(), 1);
    }

    #[test]
    fn traffic_image_hides_after_five_seconds() {
        let (mut state, _) = mounted();
        state.set_mode(Mode::Traffic);
        let commands = state.on_click(latlon!(50.5678, 10.1234));
        let [Command::LoadTraffic { generation, location }] = commands[..] else {
            panic!("unexpected commands {commands:?}");
        };
        assert_eq!(location, ClickLocation::new(10.1234, 50.5678));

        let shown_at = Instant::now();
        state.apply(
            Outcome::Traffic {
                generation,
                location,
                result: Ok(image()),
            },
            shown_at,
        );
        assert!(state.traffic_snapshot().is_some());

        assert!(!state.tick(shown_at + Duration::from_secs(4)));
        assert!(state.traffic_snapshot().is_some());
        assert!(state.tick(shown_at + Duration::from_secs(5)));
        assert!(state.traffic_snapshot().is_none());
    }

    #[test]
    fn newer_traffic_click_wins() {
        let (mut state, _) = mounted();
        state.set_mode(Mode::Traffic);
        let first = state.on_click(latlon!(1.0, 1.0));
        let second = state.on_click(latlon!(2.0, 2.0));

        let now = Instant::now();
        for command in second.into_iter().chain(first) {
            let Command::LoadTraffic {
                generation,
                location,
            } = command
            else {
                panic!("unexpected command {command:?}");
            };
            state.apply(
                Outcome::Traffic {
                    generation,
                    location,
                    result: Ok(image()),
                },
                now,
            );
        }

        let snapshot = state.traffic_snapshot().unwrap();
        assert_eq!(snapshot.location(), ClickLocation::new(2.0, 2.0));
        assert_eq!(snapshot.id(), 1);
    }

    #[test]
    fn report_flow() {
        let (mut state, _) = mounted();
        state.set_mode(Mode::AddIncident);
        let commands = state.on_click(latlon!(4.4, 3.3));
        assert_matches!(commands[..], [Command::LoadIncidents { .. }]);

        let report = state.pending_report_mut().unwrap();
        assert_eq!(report.location(), ClickLocation::new(3.3, 4.4));
        report.description.push_str("tree down");
        report.kind.push_str("debris");

        let command = state.submit_report().unwrap();
        assert_eq!(
            command,
            Command::SubmitIncident {
                incident: Incident {
                    lat: "4.40".into(),
                    lng: "3.30".into(),
                    short_desc: "tree down".into(),
                    kind: "debris".into(),
                }
            }
        );
        assert!(state.pending_report().is_none());

        let follow_up = state.apply(
            Outcome::IncidentSubmitted {
                result: Ok(serde_json::json!({"ok": true})),
            },
            Instant::now(),
        );
        assert_matches!(follow_up[..], [Command::LoadIncidents { .. }]);
    }

    #[test]
    fn failed_submission_is_not_refreshed() {
        let (mut state, _) = mounted();
        let follow_up = state.apply(
            Outcome::IncidentSubmitted {
                result: Err(IncidentMapError::Io("connection refused".into())),
            },
            Instant::now(),
        );
        assert!(follow_up.is_empty());
    }

    #[test]
    fn second_report_click_moves_pending_report() {
        let (mut state, _) = mounted();
        state.set_mode(Mode::AddIncident);
        state.on_click(latlon!(1.0, 1.0));
        state
            .pending_report_mut()
            .unwrap()
            .description
            .push_str("flood");
        state.on_click(latlon!(2.0, 2.0));

        let report = state.pending_report().unwrap();
        assert_eq!(report.location(), ClickLocation::new(2.0, 2.0));
        assert_eq!(report.description, "flood");

        state.cancel_report();
        assert!(state.pending_report().is_none());
        assert!(state.submit_report().is_none());
    }

    #[test]
    fn mode_change_keeps_overlays() {
        let (mut state, generation) = mounted();
        state.apply(
            Outcome::Incidents {
                generation,
                result: Ok(vec![backend_incident("1.0", "2.0", "a")]),
            },
            Instant::now(),
        );
        for mode in Mode::ALL {
            state.set_mode(mode);
            assert_eq!(state.mode(), mode);
        }
        assert_eq!(state.overlays().len(), 1);
    }
}
